//! Trade the ticker with the largest 24h move once it leaves a ±2% band

use rust_decimal_macros::dec;

use crate::common::types::Ticker;
use crate::strategy::threshold::{ThresholdRule, TradeSizer};
use crate::strategy::traits::{BoxedStrategy, Strategy};
use crate::strategy::types::{StrategyAction, StrategyContext, StrategyParams};

pub struct PlusTwoMinusTwo {
    rule: ThresholdRule,
    sizer: TradeSizer,
}

impl PlusTwoMinusTwo {
    pub const NAME: &'static str = "plus_two_minus_two";

    pub fn new(params: &StrategyParams) -> Self {
        Self {
            rule: ThresholdRule::new(dec!(2)),
            sizer: TradeSizer::new(params),
        }
    }

    pub fn boxed(params: &StrategyParams) -> BoxedStrategy {
        Box::new(Self::new(params))
    }
}

impl Strategy for PlusTwoMinusTwo {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn determine_action(&mut self, ctx: &StrategyContext) -> Option<StrategyAction> {
        // Ties keep the first symbol in sorted order
        let ticker = ctx
            .tickers_with_data()
            .filter(|t| t.change_pct.is_some())
            .fold(None, |best: Option<&Ticker>, t| match best {
                Some(b) if b.change_pct.map(|p| p.abs()) >= t.change_pct.map(|p| p.abs()) => {
                    Some(b)
                }
                _ => Some(t),
            })?;

        let action_type = self.rule.classify(ticker);
        Some(self.sizer.size(ticker, action_type, ctx))
    }
}
