//! KrakenTrader Library
//!
//! An automated trading client for the Kraken exchange: streamed tickers and
//! balances feed a pluggable strategy that is evaluated on a fixed interval,
//! and its Buy/Sell proposals are balance-checked before a market order is
//! placed.

pub mod common;
pub mod config;
pub mod kraken;
pub mod logging;
pub mod store;
pub mod strategy;
pub mod trader;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::traits::{ExchangeClient, SharedExchangeClient};
pub use common::types::{
    BalanceSnapshot, BalanceUpdate, MarketEvent, OrderReceipt, Side, SubscriptionId, Ticker,
    TickerUpdate,
};
pub use config::{load_config, AppConfig};
pub use kraken::KrakenClient;
pub use store::{BalanceStore, TickerStore};
pub use trader::{DryRunClient, Trader, TraderHandle, TraderState};

// Strategy types
pub use strategy::{
    ActionType, BoxedStrategy, Strategy, StrategyAction, StrategyContext, StrategyParams,
    StrategyRegistry,
};
