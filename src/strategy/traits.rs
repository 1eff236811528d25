use crate::strategy::types::{StrategyAction, StrategyContext};

/// Core strategy trait
///
/// A strategy is polled by the trading loop once per interval with a fresh
/// [`StrategyContext`] and may propose one action.
///
/// # Implementation Notes
///
/// - `determine_action` must not block or do I/O
/// - A missing wallet balance is not an error: return a Hold action
/// - Internal state (RNG, indicators) is owned by the strategy and dropped
///   when another strategy is selected
///
/// # Example
///
/// ```ignore
/// struct AlwaysHold;
///
/// impl Strategy for AlwaysHold {
///     fn name(&self) -> &str { "always_hold" }
///
///     fn determine_action(&mut self, ctx: &StrategyContext) -> Option<StrategyAction> {
///         let ticker = ctx.tickers.first()?;
///         Some(StrategyAction::hold(&ticker.symbol, &ctx.wallet_asset))
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Unique identifier for this strategy
    fn name(&self) -> &str;

    /// Decide what to do given the current market and balance state
    ///
    /// # Returns
    /// * `None` - Nothing to act on (e.g. no ticker data yet)
    /// * `Some(action)` - Buy, Sell or Hold
    fn determine_action(&mut self, ctx: &StrategyContext) -> Option<StrategyAction>;
}

/// Boxed strategy for dynamic dispatch
pub type BoxedStrategy = Box<dyn Strategy>;
