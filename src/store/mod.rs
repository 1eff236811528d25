//! Shared market and account state
//!
//! The market feed is the only writer; the trading loop reads a copy once
//! per cycle.

mod balance_store;
mod ticker_store;

pub use balance_store::{BalanceStore, SharedBalanceStore};
pub use ticker_store::{SharedTickerStore, TickerStore};
