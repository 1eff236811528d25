//! Periodic strategy evaluation loop
//!
//! Lifecycle: `Idle` → `Running` → `Stopped`. A stopped trader cannot be
//! restarted; build a new one instead.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::common::channels::{create_event_channel, EventSender};
use crate::common::errors::{Result, TraderError};
use crate::common::traits::SharedExchangeClient;
use crate::common::types::SubscriptionId;
use crate::config::TraderSettings;
use crate::store::{BalanceStore, SharedBalanceStore, SharedTickerStore, TickerStore};
use crate::strategy::{StrategyContext, StrategyRegistry};
use crate::trader::action_processor::ActionProcessor;
use crate::trader::feed::MarketFeed;

/// Lifecycle state of a [`Trader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderState {
    Idle,
    Running,
    Stopped,
}

/// Requests accepted by a running trader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraderCommand {
    /// Switch the active strategy at the next iteration
    SelectStrategy(String),
}

/// Cloneable control handle for a [`Trader`]
///
/// Remains usable while `run` borrows the trader.
#[derive(Clone)]
pub struct TraderHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    command_tx: mpsc::UnboundedSender<TraderCommand>,
}

impl TraderHandle {
    /// Ask the loop to exit at its next iteration boundary
    ///
    /// An in-progress sleep is allowed to finish.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Queue a strategy change
    pub fn select_strategy(&self, name: impl Into<String>) -> Result<()> {
        self.command_tx
            .send(TraderCommand::SelectStrategy(name.into()))
            .map_err(|e| TraderError::ChannelSend(e.to_string()))
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

/// Owns the stores, the strategy registry and the exchange subscriptions
pub struct Trader {
    settings: TraderSettings,
    client: SharedExchangeClient,
    tickers: SharedTickerStore,
    balances: SharedBalanceStore,
    registry: StrategyRegistry,
    processor: ActionProcessor,
    state: TraderState,
    subscriptions: Vec<SubscriptionId>,
    failed_subscriptions: Vec<String>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    command_tx: mpsc::UnboundedSender<TraderCommand>,
    command_rx: mpsc::UnboundedReceiver<TraderCommand>,
}

impl Trader {
    pub fn new(
        settings: TraderSettings,
        client: SharedExchangeClient,
        registry: StrategyRegistry,
    ) -> Self {
        let tickers = Arc::new(TickerStore::new(settings.ticker_symbols.iter()));
        let balances = Arc::new(BalanceStore::new());
        let processor = ActionProcessor::new(Arc::clone(&client), Arc::clone(&balances));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            settings,
            client,
            tickers,
            balances,
            registry,
            processor,
            state: TraderState::Idle,
            subscriptions: Vec::new(),
            failed_subscriptions: Vec::new(),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> TraderHandle {
        TraderHandle {
            shutdown_tx: Arc::clone(&self.shutdown_tx),
            command_tx: self.command_tx.clone(),
        }
    }

    pub fn state(&self) -> TraderState {
        self.state
    }

    pub fn tickers(&self) -> &SharedTickerStore {
        &self.tickers
    }

    pub fn balances(&self) -> &SharedBalanceStore {
        &self.balances
    }

    /// Streams whose subscription failed during startup
    pub fn failed_subscriptions(&self) -> &[String] {
        &self.failed_subscriptions
    }

    pub fn active_strategy(&self) -> Option<&str> {
        self.registry.active_name()
    }

    /// Start the trader and evaluate the strategy until stopped
    ///
    /// Fails without side effects if the configured strategy is unknown,
    /// and fails if the exchange cannot be connected. Stream subscription
    /// failures are logged and recorded but do not abort the run.
    #[instrument(skip(self), fields(exchange = %self.client.exchange_name()))]
    pub async fn run(&mut self) -> Result<()> {
        if self.state != TraderState::Idle {
            return Err(TraderError::InvalidState(format!(
                "run called while {:?}",
                self.state
            )));
        }

        self.registry.select(&self.settings.selected_strategy)?;
        self.client.connect().await?;

        let (sender, receiver) = create_event_channel();
        let feed = MarketFeed::new(Arc::clone(&self.tickers), Arc::clone(&self.balances))
            .spawn(receiver);

        self.state = TraderState::Running;
        self.subscribe_streams(&sender).await;
        drop(sender);

        let interval = self.settings.strategy_interval();
        info!(
            strategy = ?self.registry.active_name(),
            interval_ms = %interval.as_millis(),
            symbols = ?self.settings.ticker_symbols,
            "trader started"
        );

        while !*self.shutdown_rx.borrow() {
            self.run_iteration().await;
            tokio::time::sleep(interval).await;
        }

        info!("stop requested, shutting down");
        self.shutdown(feed).await;
        Ok(())
    }

    async fn subscribe_streams(&mut self, sender: &EventSender) {
        match self.client.subscribe_balances(sender.clone()).await {
            Ok(id) => self.subscriptions.push(id),
            Err(e) => self.record_failed_subscription("balances", e),
        }

        for symbol in self.tickers.symbols() {
            match self.client.subscribe_ticker(&symbol, sender.clone()).await {
                Ok(id) => self.subscriptions.push(id),
                Err(e) => self.record_failed_subscription(&format!("ticker:{symbol}"), e),
            }
        }
    }

    fn record_failed_subscription(&mut self, stream: &str, reason: TraderError) {
        let err = TraderError::SubscriptionFailed {
            stream: stream.to_string(),
            reason: reason.to_string(),
        };
        error!(error = %err, "subscription failed, continuing without it");
        self.failed_subscriptions.push(stream.to_string());
    }

    async fn run_iteration(&mut self) {
        self.apply_commands();

        let ctx = self.build_context();
        let Some(action) = self.registry.determine_action(&ctx) else {
            debug!("strategy produced no action");
            return;
        };

        if action.is_hold() {
            if self.settings.log_hold_actions {
                info!(symbol = %action.symbol(), "hold");
            } else {
                debug!(symbol = %action.symbol(), "hold");
            }
            return;
        }

        // Rejections and placement failures are logged by the processor
        if let Ok(Some(receipt)) = self.processor.process(&action).await {
            debug!(order_ids = ?receipt.order_ids, "iteration placed order");
        }
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                TraderCommand::SelectStrategy(name) => {
                    // Unknown names keep the current strategy
                    let _ = self.registry.select(&name);
                }
            }
        }
    }

    fn build_context(&self) -> StrategyContext {
        StrategyContext::new(
            self.tickers.snapshot(),
            self.balances.lookup(&self.settings.wallet_asset),
            self.settings.wallet_asset.clone(),
        )
    }

    async fn shutdown(&mut self, feed: JoinHandle<()>) {
        for id in self.subscriptions.drain(..) {
            if let Err(e) = self.client.unsubscribe(id).await {
                warn!(subscription = %id, error = %e, "unsubscribe failed");
            }
        }
        if let Err(e) = self.client.disconnect().await {
            warn!(error = %e, "disconnect failed");
        }

        feed.abort();
        let _ = feed.await;

        self.state = TraderState::Stopped;
        info!("trader stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::MockExchangeClient;
    use crate::strategy::StrategyParams;
    use std::time::Duration;

    fn settings(strategy: &str) -> TraderSettings {
        TraderSettings {
            ticker_symbols: vec!["BTC/USD".to_string()],
            strategy_interval_ms: 20,
            selected_strategy: strategy.to_string(),
            wallet_asset: "USD".to_string(),
            log_hold_actions: false,
            dry_run: false,
        }
    }

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_builtin(StrategyParams::default())
    }

    #[tokio::test]
    async fn test_unknown_initial_strategy_fails_before_connecting() {
        let mut mock = MockExchangeClient::new();
        mock.expect_connect().times(0);
        mock.expect_exchange_name().return_const("mock");

        let mut trader = Trader::new(settings("missing"), Arc::new(mock), registry());
        let err = trader.run().await.unwrap_err();

        assert!(matches!(err, TraderError::StrategyNotFound(ref n) if n == "missing"));
        assert_eq!(trader.state(), TraderState::Idle);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let mut mock = MockExchangeClient::new();
        mock.expect_connect()
            .times(1)
            .returning(|| Err(TraderError::WebSocketConnection("refused".into())));
        mock.expect_subscribe_balances().times(0);
        mock.expect_exchange_name().return_const("mock");

        let mut trader = Trader::new(settings("fifty_fifty"), Arc::new(mock), registry());
        assert!(matches!(
            trader.run().await,
            Err(TraderError::WebSocketConnection(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_subscriptions_are_recorded_and_loop_stops() {
        let mut mock = MockExchangeClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_subscribe_balances()
            .returning(|_| Err(TraderError::Authentication("no credentials".into())));
        mock.expect_subscribe_ticker()
            .returning(|_, _| Ok(SubscriptionId(1)));
        mock.expect_unsubscribe()
            .withf(|id| *id == SubscriptionId(1))
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_disconnect().times(1).returning(|| Ok(()));
        mock.expect_place_market_order().times(0);
        mock.expect_exchange_name().return_const("mock");

        let mut trader = Trader::new(settings("fifty_fifty"), Arc::new(mock), registry());
        let handle = trader.handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            handle.stop();
        });

        trader.run().await.unwrap();

        assert_eq!(trader.state(), TraderState::Stopped);
        assert_eq!(trader.failed_subscriptions(), ["balances".to_string()]);
        assert!(matches!(trader.run().await, Err(TraderError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_select_strategy_command_applies_at_next_iteration() {
        let mut trader = Trader::new(
            settings("fifty_fifty"),
            Arc::new(MockExchangeClient::new()),
            registry(),
        );
        trader.registry.select("fifty_fifty").unwrap();

        let handle = trader.handle();
        handle.select_strategy("plus_two_minus_two").unwrap();
        handle.select_strategy("NoSuchStrategy").unwrap();
        trader.apply_commands();

        assert_eq!(trader.active_strategy(), Some("plus_two_minus_two"));
    }

    #[test]
    fn test_stop_flag_is_shared_with_handles() {
        let trader = Trader::new(
            settings("fifty_fifty"),
            Arc::new(MockExchangeClient::new()),
            registry(),
        );
        let handle = trader.handle();
        assert!(!handle.is_stop_requested());
        handle.clone().stop();
        assert!(handle.is_stop_requested());
        assert!(*trader.shutdown_rx.borrow());
    }
}
