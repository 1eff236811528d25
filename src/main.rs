//! KrakenTrader - Main Entry Point
//!
//! Connects to Kraken, keeps tickers and balances current and runs the
//! selected strategy until Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use kraken_trader::logging::init_logging;
use kraken_trader::{
    load_config, DryRunClient, KrakenClient, SharedExchangeClient, StrategyParams,
    StrategyRegistry, Trader,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Strategy to start with; overrides trader.selected_strategy
    #[arg(short, long)]
    strategy: Option<String>,

    /// Simulate orders instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the available strategies and exit
    #[arg(long)]
    list_strategies: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Strategy names do not depend on configuration
    if args.list_strategies {
        for name in StrategyRegistry::with_builtin(StrategyParams::default()).list_available() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = load_config(Some(&args.config))
        .with_context(|| format!("failed to load configuration from {}", args.config))?;
    let registry = StrategyRegistry::with_builtin(config.strategy.clone());

    if let Some(strategy) = args.strategy {
        config.trader.selected_strategy = strategy;
    }
    config.trader.dry_run |= args.dry_run;

    let level = args
        .log_level
        .unwrap_or_else(|| config.settings.log_level.clone());
    let _log_guard = init_logging(
        &level,
        args.json_logs || config.settings.json_logs,
        &config.settings,
    )?;

    info!("Starting KrakenTrader");
    info!("Configuration file: {}", args.config);
    if let Some(dir) = &config.settings.log_dir {
        info!("Writing daily log files to {}", dir.display());
    }

    let kraken = Arc::new(KrakenClient::new(config.kraken.clone())?);
    let client: SharedExchangeClient = if config.trader.dry_run {
        warn!("Dry run enabled, orders will be simulated");
        Arc::new(DryRunClient::new(kraken))
    } else {
        kraken
    };

    let mut trader = Trader::new(config.trader.clone(), client, registry);
    let handle = trader.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping after the current interval");
            handle.stop();
        }
    });

    trader.run().await?;

    info!("Shutdown complete");
    Ok(())
}
