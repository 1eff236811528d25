//! Kraken-specific message types (WebSocket v2 and REST)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::Side;

// ============================================================================
// Outgoing WebSocket requests
// ============================================================================

/// Request envelope sent on either socket
#[derive(Debug, Clone, Serialize)]
pub struct WsRequest<P> {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_id: Option<u64>,
}

/// Parameters for `subscribe` / `unsubscribe`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionParams {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,
    /// Session token, private channels only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SubscriptionParams {
    pub fn ticker(symbol: &str) -> Self {
        Self {
            channel: "ticker".to_string(),
            symbol: Some(vec![symbol.to_string()]),
            snapshot: Some(true),
            token: None,
        }
    }

    pub fn balances(token: &str) -> Self {
        Self {
            channel: "balances".to_string(),
            symbol: None,
            snapshot: Some(true),
            token: Some(token.to_string()),
        }
    }
}

/// Parameters for `add_order`
///
/// Exactly one quantity is set: `order_qty` is in base units and
/// `cash_order_qty` in quote units.
#[derive(Debug, Clone, Serialize)]
pub struct AddOrderParams {
    pub order_type: &'static str,
    pub side: Side,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_qty: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash_order_qty: Option<Decimal>,
    pub symbol: String,
    pub token: String,
}

impl AddOrderParams {
    /// Market order sized in the asset being spent: quote for a Buy, base for a Sell
    pub fn market(symbol: &str, side: Side, amount: Decimal, token: &str) -> Self {
        let (order_qty, cash_order_qty) = match side {
            Side::Buy => (None, Some(amount)),
            Side::Sell => (Some(amount), None),
        };
        Self {
            order_type: "market",
            side,
            order_qty,
            cash_order_qty,
            symbol: symbol.to_string(),
            token: token.to_string(),
        }
    }
}

// ============================================================================
// Incoming WebSocket messages
// ============================================================================

/// Acknowledgement of a request (`subscribe`, `add_order`, `pong`, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct WsResponse {
    pub method: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub req_id: Option<u64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl WsResponse {
    /// `pong` carries no `success` field
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(self.error.is_none())
    }
}

/// Data push on a subscribed channel
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage<T> {
    pub channel: String,
    /// `snapshot` or `update`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> ChannelMessage<T> {
    pub fn is_snapshot(&self) -> bool {
        self.kind.as_deref() == Some("snapshot")
    }
}

/// One entry of `ticker` channel data
#[derive(Debug, Clone, Deserialize)]
pub struct TickerData {
    pub symbol: String,
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub low: Option<Decimal>,
    #[serde(default)]
    pub high: Option<Decimal>,
    #[serde(default)]
    pub change: Option<Decimal>,
    #[serde(default)]
    pub change_pct: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

/// One entry of `balances` channel data
///
/// Snapshots list every asset; updates are ledger entries that carry the
/// post-entry balance.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceData {
    pub asset: String,
    pub balance: Decimal,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `result` of a successful `add_order`
#[derive(Debug, Clone, Deserialize)]
pub struct AddOrderResult {
    pub order_id: String,
    #[serde(default)]
    pub cl_ord_id: Option<String>,
}

// ============================================================================
// REST
// ============================================================================

/// Standard REST envelope: errors are returned in the body with status 200
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenResponse<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

/// `result` of `GetWebSocketsToken`
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketsToken {
    pub token: String,
    /// Seconds the token stays valid if no connection uses it
    pub expires: u64,
}
