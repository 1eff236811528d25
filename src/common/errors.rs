//! Error types for the application

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Main error type for trader operations
#[derive(Error, Debug)]
pub enum TraderError {
    /// No strategy is registered under the requested identifier
    #[error("Strategy not found: {0}")]
    StrategyNotFound(String),

    /// Balance check rejected a buy or sell
    #[error("Insufficient {asset} balance: required {required}, available {}", display_available(.available))]
    InsufficientBalance {
        asset: String,
        required: Decimal,
        available: Option<Decimal>,
    },

    /// The exchange refused or failed to place an order
    #[error("Order placement failed: {0}")]
    OrderPlacementFailed(String),

    /// A ticker or balance stream could not be subscribed
    #[error("Subscription to {stream} failed: {reason}")]
    SubscriptionFailed { stream: String, reason: String },

    /// Symbol is not in BASE/QUOTE form
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Action cannot be dispatched as given
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Operation not allowed in the trader's current lifecycle state
    #[error("Invalid trader state: {0}")]
    InvalidState(String),

    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Errors reported in an exchange API response body
    #[error("Exchange API error: {}", .0.join(", "))]
    ExchangeApi(Vec<String>),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_available(available: &Option<Decimal>) -> String {
    match available {
        Some(balance) => balance.to_string(),
        None => "none".to_string(),
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TraderError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TraderError::WebSocketCommunication(err.to_string())
    }
}
