//! Unified types shared by the stores, strategies and exchange clients

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{Result, TraderError};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A trading symbol split into its base and quote assets
///
/// `BTC/USD` trades BTC (base) priced in USD (quote).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolPair {
    pub base: String,
    pub quote: String,
}

impl SymbolPair {
    /// Parse a `BASE/QUOTE` symbol
    pub fn parse(symbol: &str) -> Result<Self> {
        let mut parts = symbol.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.trim().is_empty() && !quote.trim().is_empty() => {
                Ok(Self {
                    base: base.trim().to_string(),
                    quote: quote.trim().to_string(),
                })
            }
            _ => Err(TraderError::InvalidSymbol(symbol.to_string())),
        }
    }

    /// Asset that leaves the account when trading on `side`
    pub fn paying_asset(&self, side: Side) -> &str {
        match side {
            Side::Buy => &self.quote,
            Side::Sell => &self.base,
        }
    }
}

impl std::fmt::Display for SymbolPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Live market summary for one trading symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    /// Last traded price
    pub last: Option<Decimal>,
    /// 24h low
    pub low: Option<Decimal>,
    /// 24h high
    pub high: Option<Decimal>,
    /// 24h absolute price change
    pub change: Option<Decimal>,
    /// 24h price change in percent
    pub change_pct: Option<Decimal>,
    /// When the last update was applied, `None` until the first one
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the stream feeding this ticker dropped; cleared by the next update
    #[serde(default)]
    pub stale: bool,
}

impl Ticker {
    /// Create an empty ticker awaiting its first update
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            last: None,
            low: None,
            high: None,
            change: None,
            change_pct: None,
            updated_at: None,
            stale: false,
        }
    }

    /// Overwrite every price field with the update's values
    pub fn apply(&mut self, update: &TickerUpdate) {
        self.last = update.last;
        self.low = update.low;
        self.high = update.high;
        self.change = update.change;
        self.change_pct = update.change_pct;
        self.updated_at = Some(Utc::now());
        self.stale = false;
    }

    /// Keep the last prices but stop offering them to strategies
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Whether the ticker holds prices from a live stream
    pub fn has_data(&self) -> bool {
        self.updated_at.is_some() && !self.stale
    }
}

/// Ticker update received from the exchange stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerUpdate {
    pub symbol: String,
    pub last: Option<Decimal>,
    pub low: Option<Decimal>,
    pub high: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_pct: Option<Decimal>,
}

/// Point-in-time available quantity of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub asset: String,
    pub balance: Decimal,
}

impl BalanceSnapshot {
    pub fn new(asset: impl Into<String>, balance: Decimal) -> Self {
        Self {
            asset: asset.into(),
            balance,
        }
    }
}

/// Post-ledger balance of a single asset after a trade, deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub asset: String,
    pub balance: Decimal,
    /// Ledger entry type reported by the exchange (trade, deposit, ...)
    #[serde(default)]
    pub kind: Option<String>,
}

/// Confirmation of an order accepted by the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Exchange-assigned order identifiers
    pub order_ids: Vec<String>,
    pub symbol: String,
    pub side: Side,
    pub amount: Decimal,
    /// Human readable description, if the exchange returns one
    #[serde(default)]
    pub description: Option<String>,
    pub placed_at: DateTime<Utc>,
    /// True when the order never left the process (dry run)
    #[serde(default)]
    pub simulated: bool,
}

/// Handle identifying one stream subscription on an exchange client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Connection status for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Successfully connected
    Connected,
    /// Disconnected (with optional reason)
    Disconnected(Option<String>),
    /// Connection error
    Error(String),
}

/// Event streamed from an exchange client to the market feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Ticker snapshot or update for one symbol
    Ticker(TickerUpdate),
    /// Complete set of account balances, replaces everything known
    BalanceSnapshot(Vec<BalanceSnapshot>),
    /// Incremental per-asset balance changes
    BalanceUpdate(Vec<BalanceUpdate>),
    /// Connection status change
    ConnectionStatus { stream: String, status: ConnectionStatus },
    /// Heartbeat from the exchange
    Heartbeat,
    /// Raw/unknown message (for debugging)
    Raw(String),
}
