//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{Result, TraderError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `KRAKEN_API_KEY` / `KRAKEN_API_SECRET`
/// 2. Environment variables (`APP__TRADER__WALLET_ASSET`, ...)
/// 3. Configuration file (TOML format)
/// 4. Default values
///
/// The returned configuration has already been validated.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    // Pick up a .env file before reading the environment
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // APP__TRADER__TICKER_SYMBOLS="BTC/USD,ETH/USD"
    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("trader.ticker_symbols")
            .try_parsing(true),
    );

    builder = builder
        .set_override_option("kraken.api_key", std::env::var("KRAKEN_API_KEY").ok())
        .and_then(|b| {
            b.set_override_option("kraken.api_secret", std::env::var("KRAKEN_API_SECRET").ok())
        })
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    app_config.validate()?;
    Ok(app_config)
}
