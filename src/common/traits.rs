//! Trait definitions for exchange clients

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::channels::EventSender;
use super::errors::Result;
use super::types::{OrderReceipt, Side, SubscriptionId};

/// Trait for exchange connectivity (Kraken, dry run, test fakes)
///
/// Stream data is delivered as `MarketEvent`s on the sender passed to
/// each subscribe call. Methods take `&self` so one client can be shared
/// between the trading loop and the action processor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Open the underlying connections
    async fn connect(&self) -> Result<()>;

    /// Subscribe to account balance snapshots and updates
    async fn subscribe_balances(&self, sender: EventSender) -> Result<SubscriptionId>;

    /// Subscribe to ticker updates for one symbol
    ///
    /// # Arguments
    /// * `symbol` - Trading symbol in `BASE/QUOTE` form
    /// * `sender` - Channel sender for forwarding events
    async fn subscribe_ticker(&self, symbol: &str, sender: EventSender) -> Result<SubscriptionId>;

    /// Cancel a subscription; its sender receives no further events
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Place a market order for `amount` of `symbol`
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
    ) -> Result<OrderReceipt>;

    /// Gracefully disconnect from the exchange
    async fn disconnect(&self) -> Result<()>;

    /// Name of the exchange, used in logs
    fn exchange_name(&self) -> &'static str;
}

/// Exchange client shared between tasks
pub type SharedExchangeClient = Arc<dyn ExchangeClient>;
