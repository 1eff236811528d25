//! Strategy module for trade decision making
//!
//! This module provides the abstractions for pluggable trading strategies
//! and the registry used to pick one at runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ASYNC (market feed)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Ticker / balance events → TickerStore, BalanceStore        │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TRADING LOOP (every interval)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StrategyContext built from store copies                    │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StrategyRegistry → active Strategy.determine_action()      │
//! │       │                                                     │
//! │       ▼ (Buy / Sell)                                        │
//! │  ActionProcessor                                            │
//! │    - Checks the paying asset's balance                      │
//! │    - Places a market order                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Strategy`]: Trait for implementing trading strategies
//! - [`StrategyAction`]: Buy/Sell/Hold proposal returned by strategies
//! - [`StrategyContext`]: Read-only state provided to strategies
//! - [`StrategyRegistry`]: Static name → factory table with one active strategy

mod fifty_fifty;
mod plus_two_minus_two;
mod registry;
mod threshold;
mod traits;
mod types;

pub use types::{ActionType, StrategyAction, StrategyContext, StrategyParams};

pub use traits::{BoxedStrategy, Strategy};

pub use registry::{StrategyFactory, StrategyRegistry, BUILTIN_STRATEGIES};

pub use fifty_fifty::FiftyFifty;
pub use plus_two_minus_two::PlusTwoMinusTwo;
