use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, TraderError};
use crate::common::types::{BalanceSnapshot, Side, Ticker};

/// What a strategy wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Buy => write!(f, "buy"),
            ActionType::Sell => write!(f, "sell"),
            ActionType::Hold => write!(f, "hold"),
        }
    }
}

/// A trade proposed by a strategy
///
/// Immutable once built. The amount is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAction {
    symbol: String,
    asset: String,
    action_type: ActionType,
    amount: Decimal,
}

impl StrategyAction {
    /// Build an action; negative amounts are clamped to zero
    pub fn new(
        symbol: impl Into<String>,
        asset: impl Into<String>,
        action_type: ActionType,
        amount: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            asset: asset.into(),
            action_type,
            amount: amount.max(Decimal::ZERO),
        }
    }

    pub fn buy(symbol: impl Into<String>, asset: impl Into<String>, amount: Decimal) -> Self {
        Self::new(symbol, asset, ActionType::Buy, amount)
    }

    pub fn sell(symbol: impl Into<String>, asset: impl Into<String>, amount: Decimal) -> Self {
        Self::new(symbol, asset, ActionType::Sell, amount)
    }

    pub fn hold(symbol: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(symbol, asset, ActionType::Hold, Decimal::ZERO)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Asset whose balance the strategy sized the trade from
    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_hold(&self) -> bool {
        self.action_type == ActionType::Hold
    }

    /// Order side implied by the action, `None` for Hold
    pub fn side(&self) -> Option<Side> {
        match self.action_type {
            ActionType::Buy => Some(Side::Buy),
            ActionType::Sell => Some(Side::Sell),
            ActionType::Hold => None,
        }
    }
}

/// Read-only state handed to a strategy on each evaluation
///
/// Built by the trading loop from copies of the stores, so the strategy
/// sees one consistent view for the whole call.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    /// Every tracked ticker, sorted by symbol
    pub tickers: Vec<Ticker>,
    /// Balance of the wallet asset, `None` until a snapshot arrives
    pub balance: Option<BalanceSnapshot>,
    /// Configured wallet asset
    pub wallet_asset: String,
    /// When the context was built
    pub timestamp: DateTime<Utc>,
}

impl StrategyContext {
    pub fn new(
        tickers: Vec<Ticker>,
        balance: Option<BalanceSnapshot>,
        wallet_asset: impl Into<String>,
    ) -> Self {
        Self {
            tickers,
            balance,
            wallet_asset: wallet_asset.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the ticker for a symbol
    pub fn ticker(&self, symbol: &str) -> Option<&Ticker> {
        self.tickers.iter().find(|t| t.symbol == symbol)
    }

    /// Tickers that have received at least one update
    pub fn tickers_with_data(&self) -> impl Iterator<Item = &Ticker> {
        self.tickers.iter().filter(|t| t.has_data())
    }

    /// Wallet balance, if known
    pub fn balance(&self) -> Option<&BalanceSnapshot> {
        self.balance.as_ref()
    }
}

/// Parameters handed to strategy factories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Upper bound on the share of the wallet balance committed per trade
    #[serde(default = "default_max_trade_fraction")]
    pub max_trade_fraction: Decimal,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            max_trade_fraction: default_max_trade_fraction(),
            seed: None,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_trade_fraction <= Decimal::ZERO || self.max_trade_fraction > Decimal::ONE {
            return Err(TraderError::Configuration(format!(
                "strategy.max_trade_fraction must be in (0, 1], got {}",
                self.max_trade_fraction
            )));
        }
        Ok(())
    }
}

fn default_max_trade_fraction() -> Decimal {
    dec!(0.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_clamps_negative_amount() {
        let action = StrategyAction::buy("BTC/USD", "USD", dec!(-5));
        assert_eq!(action.amount(), Decimal::ZERO);
        assert_eq!(action.side(), Some(Side::Buy));
    }

    #[test]
    fn test_hold_has_no_side() {
        let action = StrategyAction::hold("BTC/USD", "USD");
        assert!(action.is_hold());
        assert_eq!(action.side(), None);
        assert_eq!(action.amount(), Decimal::ZERO);
    }

    #[test]
    fn test_context_filters_tickers_without_data() {
        let mut btc = Ticker::new("BTC/USD");
        btc.updated_at = Some(Utc::now());
        let ctx = StrategyContext::new(vec![btc, Ticker::new("ETH/USD")], None, "USD");

        let with_data: Vec<&str> = ctx.tickers_with_data().map(|t| t.symbol.as_str()).collect();
        assert_eq!(with_data, vec!["BTC/USD"]);
        assert!(ctx.ticker("ETH/USD").is_some());
        assert!(ctx.balance().is_none());
    }

    #[test]
    fn test_params_validation() {
        assert!(StrategyParams::default().validate().is_ok());
        let params = StrategyParams {
            max_trade_fraction: dec!(1.5),
            seed: None,
        };
        assert!(params.validate().is_err());
        let params = StrategyParams {
            max_trade_fraction: Decimal::ZERO,
            seed: None,
        };
        assert!(params.validate().is_err());
    }
}
