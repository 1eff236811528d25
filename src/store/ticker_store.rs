//! Per-symbol ticker state

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::common::types::{Ticker, TickerUpdate};

/// Latest ticker for every tracked symbol
///
/// The set of symbols is fixed at construction. Updates for symbols that
/// were not configured are dropped so a malformed feed cannot grow the store.
pub struct TickerStore {
    tickers: RwLock<HashMap<String, Ticker>>,
}

impl TickerStore {
    /// Create a store with an empty entry for each symbol
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tickers = symbols
            .into_iter()
            .map(|s| {
                let symbol = s.into();
                (symbol.clone(), Ticker::new(symbol))
            })
            .collect();

        Self {
            tickers: RwLock::new(tickers),
        }
    }

    /// Get a copy of the ticker for a symbol
    pub fn get(&self, symbol: &str) -> Option<Ticker> {
        self.tickers.read().get(symbol).cloned()
    }

    /// Apply an update to a tracked symbol
    ///
    /// Returns `false` when the symbol is not tracked.
    pub fn update(&self, update: &TickerUpdate) -> bool {
        let mut tickers = self.tickers.write();
        match tickers.get_mut(&update.symbol) {
            Some(ticker) => {
                ticker.apply(update);
                true
            }
            None => {
                debug!(symbol = %update.symbol, "dropping update for untracked symbol");
                false
            }
        }
    }

    /// Flag every ticker that has data as stale, returning how many were
    pub fn mark_all_stale(&self) -> usize {
        let mut marked = 0;
        for ticker in self.tickers.write().values_mut() {
            if ticker.has_data() {
                ticker.mark_stale();
                marked += 1;
            }
        }
        marked
    }

    /// Copy of every ticker, sorted by symbol
    pub fn snapshot(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = self.tickers.read().values().cloned().collect();
        tickers.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tickers
    }

    /// Tracked symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.tickers.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.tickers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.read().is_empty()
    }
}

/// Shared ticker store handle
pub type SharedTickerStore = Arc<TickerStore>;
