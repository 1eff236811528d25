//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use kraken_trader::common::channels::EventSender;
use kraken_trader::config::TraderSettings;
use kraken_trader::{
    BalanceSnapshot, ExchangeClient, MarketEvent, OrderReceipt, Result, Side, SubscriptionId,
    TickerUpdate,
};

/// An order the fake exchange accepted
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOrder {
    pub symbol: String,
    pub side: Side,
    pub amount: Decimal,
}

/// In-memory exchange that records every call
///
/// `subscribe_balances` immediately pushes the configured balance snapshot
/// and `subscribe_ticker` pushes a ticker update for the symbol.
pub struct FakeExchange {
    balances: Vec<BalanceSnapshot>,
    orders: Mutex<Vec<RecordedOrder>>,
    subscribed: Mutex<Vec<(SubscriptionId, String)>>,
    unsubscribed: Mutex<Vec<SubscriptionId>>,
    connected: AtomicBool,
    disconnected: AtomicBool,
    next_id: AtomicU64,
}

impl FakeExchange {
    pub fn with_balances(balances: Vec<BalanceSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            balances,
            orders: Mutex::new(Vec::new()),
            subscribed: Mutex::new(Vec::new()),
            unsubscribed: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn orders(&self) -> Vec<RecordedOrder> {
        self.orders.lock().clone()
    }

    /// Streams subscribed so far (`balances`, `ticker:BTC/USD`, ...)
    pub fn subscribed_streams(&self) -> Vec<String> {
        self.subscribed.lock().iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscribed.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.lock().clone()
    }

    pub fn was_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn was_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    fn record_subscription(&self, stream: String) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribed.lock().push((id, stream));
        id
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe_balances(&self, sender: EventSender) -> Result<SubscriptionId> {
        let id = self.record_subscription("balances".to_string());
        let _ = sender
            .send(MarketEvent::BalanceSnapshot(self.balances.clone()))
            .await;
        Ok(id)
    }

    async fn subscribe_ticker(&self, symbol: &str, sender: EventSender) -> Result<SubscriptionId> {
        let id = self.record_subscription(format!("ticker:{symbol}"));
        let _ = sender.send(MarketEvent::Ticker(sample_ticker(symbol))).await;
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.unsubscribed.lock().push(id);
        Ok(())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
    ) -> Result<OrderReceipt> {
        let mut orders = self.orders.lock();
        orders.push(RecordedOrder {
            symbol: symbol.to_string(),
            side,
            amount,
        });
        Ok(OrderReceipt {
            order_ids: vec![format!("FAKE-{}", orders.len())],
            symbol: symbol.to_string(),
            side,
            amount,
            description: None,
            placed_at: chrono::Utc::now(),
            simulated: false,
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exchange_name(&self) -> &'static str {
        "fake"
    }
}

/// Create a sample ticker update for a symbol
pub fn sample_ticker(symbol: &str) -> TickerUpdate {
    TickerUpdate {
        symbol: symbol.to_string(),
        last: Some(dec!(65000)),
        low: Some(dec!(63000)),
        high: Some(dec!(66000)),
        change: Some(dec!(-780)),
        change_pct: Some(dec!(-1.19)),
    }
}

/// Trader settings for one symbol with a short interval
pub fn settings(strategy: &str, interval_ms: u64) -> TraderSettings {
    TraderSettings {
        ticker_symbols: vec!["BTC/USD".to_string()],
        strategy_interval_ms: interval_ms,
        selected_strategy: strategy.to_string(),
        wallet_asset: "USD".to_string(),
        log_hold_actions: true,
        dry_run: false,
    }
}

/// Sample Kraken v2 WebSocket messages
pub mod ws_messages {
    /// Ticker snapshot for BTC/USD
    pub const TICKER_SNAPSHOT: &str = r#"{
        "channel": "ticker",
        "type": "snapshot",
        "data": [{
            "symbol": "BTC/USD",
            "bid": 64999.9, "bid_qty": 0.5, "ask": 65000.1, "ask_qty": 1.2,
            "last": 65000.0, "volume": 1234.5, "vwap": 64800.0,
            "low": 63000.0, "high": 66000.0,
            "change": -780.0, "change_pct": -1.19
        }]
    }"#;
}
