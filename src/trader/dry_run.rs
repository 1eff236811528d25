//! Dry run client for simulated order fills.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::common::channels::EventSender;
use crate::common::errors::Result;
use crate::common::traits::{ExchangeClient, SharedExchangeClient};
use crate::common::types::{OrderReceipt, Side, SubscriptionId};

/// Wraps a live client, forwarding every stream call and answering orders
/// locally with a simulated receipt.
///
/// Market data and balances stay real, so strategies see the same inputs
/// they would in live mode.
pub struct DryRunClient {
    inner: SharedExchangeClient,
    next_order_id: AtomicU64,
}

impl DryRunClient {
    pub fn new(inner: SharedExchangeClient) -> Self {
        Self {
            inner,
            next_order_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ExchangeClient for DryRunClient {
    async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    async fn subscribe_balances(&self, sender: EventSender) -> Result<SubscriptionId> {
        self.inner.subscribe_balances(sender).await
    }

    async fn subscribe_ticker(&self, symbol: &str, sender: EventSender) -> Result<SubscriptionId> {
        self.inner.subscribe_ticker(symbol, sender).await
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.inner.unsubscribe(id).await
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
    ) -> Result<OrderReceipt> {
        let n = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        info!(symbol = %symbol, side = %side, amount = %amount, "dry run: order not sent");

        Ok(OrderReceipt {
            order_ids: vec![format!("DRY-{n}")],
            symbol: symbol.to_string(),
            side,
            amount,
            description: Some(format!("{side} {amount} {symbol} @ market")),
            placed_at: chrono::Utc::now(),
            simulated: true,
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await
    }

    fn exchange_name(&self) -> &'static str {
        self.inner.exchange_name()
    }
}
