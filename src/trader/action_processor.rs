//! Balance-checked order dispatch

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::common::errors::{Result, TraderError};
use crate::common::traits::SharedExchangeClient;
use crate::common::types::{OrderReceipt, Side, SymbolPair};
use crate::store::SharedBalanceStore;
use crate::strategy::StrategyAction;

/// Validates strategy actions against the current balances and places
/// market orders for the ones that pass
///
/// - Buy pays with the quote asset and needs `balance >= amount`
/// - Sell gives up the base asset and needs `balance > amount`; selling the
///   exact balance is refused to leave room for fees and rounding
/// - Hold is never dispatched
pub struct ActionProcessor {
    client: SharedExchangeClient,
    balances: SharedBalanceStore,
}

impl ActionProcessor {
    pub fn new(client: SharedExchangeClient, balances: SharedBalanceStore) -> Self {
        Self { client, balances }
    }

    /// Check an action without placing anything
    ///
    /// Returns the order side for an approved Buy/Sell, `None` for Hold.
    pub fn check(&self, action: &StrategyAction) -> Result<Option<Side>> {
        let Some(side) = action.side() else {
            return Ok(None);
        };

        if action.amount() <= Decimal::ZERO {
            return Err(TraderError::InvalidAction(format!(
                "{} {} with zero amount",
                side,
                action.symbol()
            )));
        }

        let pair = SymbolPair::parse(action.symbol())?;
        let asset = pair.paying_asset(side);
        let available = self.balances.lookup(asset).map(|b| b.balance);

        let approved = match (side, available) {
            (Side::Buy, Some(balance)) => balance >= action.amount(),
            (Side::Sell, Some(balance)) => balance > action.amount(),
            (_, None) => false,
        };

        if approved {
            Ok(Some(side))
        } else {
            Err(TraderError::InsufficientBalance {
                asset: asset.to_string(),
                required: action.amount(),
                available,
            })
        }
    }

    /// Validate and, if approved, place a market order
    ///
    /// Returns `Ok(None)` for Hold. Rejections and exchange failures are
    /// logged here and returned to the caller; none of them are retried.
    #[instrument(skip(self, action), fields(symbol = %action.symbol(), action = %action.action_type(), amount = %action.amount()))]
    pub async fn process(&self, action: &StrategyAction) -> Result<Option<OrderReceipt>> {
        let side = match self.check(action) {
            Ok(Some(side)) => side,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "action rejected");
                return Err(e);
            }
        };

        match self
            .client
            .place_market_order(action.symbol(), side, action.amount())
            .await
        {
            Ok(receipt) => {
                info!(
                    side = %side,
                    order_ids = ?receipt.order_ids,
                    simulated = receipt.simulated,
                    "market order placed"
                );
                Ok(Some(receipt))
            }
            Err(e) => {
                error!(side = %side, error = %e, "market order failed");
                Err(TraderError::OrderPlacementFailed(e.to_string()))
            }
        }
    }
}
