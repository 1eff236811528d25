//! Applies streamed market events to the stores

use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use crate::common::channels::EventReceiver;
use crate::common::types::{ConnectionStatus, MarketEvent};
use crate::store::{SharedBalanceStore, SharedTickerStore};

/// Sole writer of the ticker and balance stores
pub struct MarketFeed {
    tickers: SharedTickerStore,
    balances: SharedBalanceStore,
}

impl MarketFeed {
    pub fn new(tickers: SharedTickerStore, balances: SharedBalanceStore) -> Self {
        Self { tickers, balances }
    }

    /// Apply a single event
    ///
    /// A dropped stream marks every ticker stale so strategies stop acting on
    /// frozen prices. Balances keep their last value.
    pub fn apply(&self, event: MarketEvent) {
        match event {
            MarketEvent::Ticker(update) => {
                if self.tickers.update(&update) {
                    trace!(symbol = %update.symbol, last = ?update.last, "ticker updated");
                }
            }
            MarketEvent::BalanceSnapshot(snapshots) => {
                debug!(assets = snapshots.len(), "balance snapshot received");
                self.balances.replace(snapshots);
            }
            MarketEvent::BalanceUpdate(updates) => {
                debug!(assets = updates.len(), "balance update received");
                self.balances.apply_updates(&updates);
            }
            MarketEvent::ConnectionStatus { stream, status } => match status {
                ConnectionStatus::Connected => info!(stream = %stream, "stream connected"),
                ConnectionStatus::Disconnected(reason) => {
                    let stale = self.tickers.mark_all_stale();
                    error!(stream = %stream, reason = ?reason, stale, "stream disconnected, tickers withheld until the next update");
                }
                ConnectionStatus::Error(err) => {
                    let stale = self.tickers.mark_all_stale();
                    error!(stream = %stream, error = %err, stale, "stream error, tickers withheld until the next update");
                }
            },
            MarketEvent::Heartbeat => trace!("heartbeat"),
            MarketEvent::Raw(message) => debug!(message = %message, "unhandled stream message"),
        }
    }

    /// Drain `receiver` on a background task until every sender is dropped
    pub fn spawn(self, mut receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                self.apply(event);
            }
            debug!("market feed channel closed");
        })
    }
}
