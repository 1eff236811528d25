//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::common::errors::{Result, TraderError};
use crate::common::types::SymbolPair;
use crate::strategy::StrategyParams;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Kraken connectivity configuration
    #[serde(default)]
    pub kraken: KrakenConfig,
    /// Trading loop configuration
    pub trader: TraderSettings,
    /// Parameters handed to strategy factories
    #[serde(default)]
    pub strategy: StrategyParams,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.trader.validate()?;
        self.strategy.validate()?;
        self.kraken.validate()
    }
}

/// Kraken platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrakenConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret (base64) for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_kraken_rest_url")]
    pub rest_url: String,
    /// WebSocket URL for public market data
    #[serde(default = "default_kraken_ws_url")]
    pub websocket_url: String,
    /// WebSocket URL for authenticated channels (balances, orders)
    #[serde(default = "default_kraken_auth_ws_url")]
    pub auth_websocket_url: String,
    /// Request timeout in seconds (REST calls and socket request/response)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Application-level ping interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
}

impl Default for KrakenConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            rest_url: default_kraken_rest_url(),
            websocket_url: default_kraken_ws_url(),
            auth_websocket_url: default_kraken_auth_ws_url(),
            request_timeout_seconds: default_request_timeout(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
        }
    }
}

impl KrakenConfig {
    /// API credentials, if both key and secret are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("kraken.rest_url", &self.rest_url),
            ("kraken.websocket_url", &self.websocket_url),
            ("kraken.auth_websocket_url", &self.auth_websocket_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| TraderError::Configuration(format!("{name} is not a valid URL: {e}")))?;
        }
        if self.heartbeat_interval_seconds == 0 {
            return Err(TraderError::Configuration(
                "kraken.heartbeat_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_kraken_rest_url() -> String {
    "https://api.kraken.com".to_string()
}

fn default_kraken_ws_url() -> String {
    "wss://ws.kraken.com/v2".to_string()
}

fn default_kraken_auth_ws_url() -> String {
    "wss://ws-auth.kraken.com/v2".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_heartbeat_interval() -> u64 {
    10
}

/// Trading loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderSettings {
    /// Symbols to track, each in `BASE/QUOTE` form
    pub ticker_symbols: Vec<String>,
    /// Delay between strategy evaluations in milliseconds
    #[serde(default = "default_strategy_interval")]
    pub strategy_interval_ms: u64,
    /// Identifier of the strategy to run at startup
    pub selected_strategy: String,
    /// Asset whose balance is handed to strategies
    pub wallet_asset: String,
    /// Log Hold decisions at info level instead of debug
    #[serde(default)]
    pub log_hold_actions: bool,
    /// Simulate fills instead of sending orders
    #[serde(default)]
    pub dry_run: bool,
}

impl TraderSettings {
    pub fn strategy_interval(&self) -> Duration {
        Duration::from_millis(self.strategy_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker_symbols.is_empty() {
            return Err(TraderError::Configuration(
                "trader.ticker_symbols must list at least one symbol".to_string(),
            ));
        }
        for symbol in &self.ticker_symbols {
            SymbolPair::parse(symbol).map_err(|_| {
                TraderError::Configuration(format!(
                    "trader.ticker_symbols entry '{symbol}' is not in BASE/QUOTE form"
                ))
            })?;
        }
        if self.strategy_interval_ms == 0 {
            return Err(TraderError::Configuration(
                "trader.strategy_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.selected_strategy.trim().is_empty() {
            return Err(TraderError::Configuration(
                "trader.selected_strategy must not be empty".to_string(),
            ));
        }
        if self.wallet_asset.trim().is_empty() {
            return Err(TraderError::Configuration(
                "trader.wallet_asset must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_strategy_interval() -> u64 {
    30_000
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
    /// Directory for the daily rolling log file; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}
