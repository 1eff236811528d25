//! Trading loop, order dispatch and the market feed that keeps the stores
//! current

mod action_processor;
mod dry_run;
mod feed;
mod trading_loop;

pub use action_processor::ActionProcessor;
pub use dry_run::DryRunClient;
pub use feed::MarketFeed;
pub use trading_loop::{Trader, TraderCommand, TraderHandle, TraderState};
