//! Coin-flip strategy: pick a random ticker and trade it on a ±5% move

use rand::seq::SliceRandom;
use rust_decimal_macros::dec;

use crate::strategy::threshold::{ThresholdRule, TradeSizer};
use crate::strategy::traits::{BoxedStrategy, Strategy};
use crate::strategy::types::{StrategyAction, StrategyContext, StrategyParams};

pub struct FiftyFifty {
    rule: ThresholdRule,
    sizer: TradeSizer,
}

impl FiftyFifty {
    pub const NAME: &'static str = "fifty_fifty";

    pub fn new(params: &StrategyParams) -> Self {
        Self {
            rule: ThresholdRule::new(dec!(5)),
            sizer: TradeSizer::new(params),
        }
    }

    pub fn boxed(params: &StrategyParams) -> BoxedStrategy {
        Box::new(Self::new(params))
    }
}

impl Strategy for FiftyFifty {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn determine_action(&mut self, ctx: &StrategyContext) -> Option<StrategyAction> {
        let candidates: Vec<_> = ctx.tickers_with_data().collect();
        let ticker = *candidates.choose(self.sizer.rng())?;
        let action_type = self.rule.classify(ticker);
        Some(self.sizer.size(ticker, action_type, ctx))
    }
}
