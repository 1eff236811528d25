//! Percentage-change threshold rule shared by the built-in strategies

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::common::types::Ticker;
use crate::strategy::types::{ActionType, StrategyAction, StrategyContext, StrategyParams};

/// Buy when the 24h change drops below `-band`, sell when it rises above `band`
#[derive(Debug, Clone, Copy)]
pub(crate) struct ThresholdRule {
    pub band: Decimal,
}

impl ThresholdRule {
    pub fn new(band: Decimal) -> Self {
        Self { band }
    }

    /// Classify a ticker's change percentage; tickers without one hold
    pub fn classify(&self, ticker: &Ticker) -> ActionType {
        match ticker.change_pct {
            Some(pct) if pct < -self.band => ActionType::Buy,
            Some(pct) if pct > self.band => ActionType::Sell,
            _ => ActionType::Hold,
        }
    }
}

/// Random trade sizing: a uniform share of the wallet balance in
/// `[0, max_trade_fraction]`, at 1e-4 resolution
pub(crate) struct TradeSizer {
    rng: StdRng,
    max_fraction: Decimal,
}

impl TradeSizer {
    pub fn new(params: &StrategyParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            max_fraction: params.max_trade_fraction,
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn fraction(&mut self) -> Decimal {
        Decimal::new(self.rng.gen_range(0..=10_000), 4) * self.max_fraction
    }

    /// Turn a classification into an action for `ticker`
    ///
    /// Without a wallet balance, or when the drawn size rounds to zero, the
    /// result is Hold.
    pub fn size(
        &mut self,
        ticker: &Ticker,
        action_type: ActionType,
        ctx: &StrategyContext,
    ) -> StrategyAction {
        let Some(balance) = ctx.balance() else {
            return StrategyAction::hold(&ticker.symbol, &ctx.wallet_asset);
        };

        if action_type == ActionType::Hold {
            return StrategyAction::hold(&ticker.symbol, &balance.asset);
        }

        let amount = (balance.balance * self.fraction()).round_dp(8);
        if amount <= Decimal::ZERO {
            return StrategyAction::hold(&ticker.symbol, &balance.asset);
        }

        StrategyAction::new(&ticker.symbol, &balance.asset, action_type, amount)
    }
}
