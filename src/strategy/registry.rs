//! Name → factory table for runtime strategy selection

use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::common::errors::{Result, TraderError};
use crate::strategy::fifty_fifty::FiftyFifty;
use crate::strategy::plus_two_minus_two::PlusTwoMinusTwo;
use crate::strategy::traits::BoxedStrategy;
use crate::strategy::types::{StrategyAction, StrategyContext, StrategyParams};

/// Builds a fresh strategy instance
pub type StrategyFactory = fn(&StrategyParams) -> BoxedStrategy;

/// Strategies compiled into the binary
pub const BUILTIN_STRATEGIES: &[(&str, StrategyFactory)] = &[
    (FiftyFifty::NAME, FiftyFifty::boxed),
    (PlusTwoMinusTwo::NAME, PlusTwoMinusTwo::boxed),
];

struct ActiveStrategy {
    name: String,
    strategy: BoxedStrategy,
}

/// Holds the registered factories and the one active strategy
///
/// Once a selection has succeeded there is always an active strategy: a
/// failed selection leaves the previous one in place.
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
    params: StrategyParams,
    active: Option<ActiveStrategy>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new(params: StrategyParams) -> Self {
        Self {
            factories: BTreeMap::new(),
            params,
            active: None,
        }
    }

    /// Create a registry preloaded with [`BUILTIN_STRATEGIES`]
    pub fn with_builtin(params: StrategyParams) -> Self {
        let mut registry = Self::new(params);
        for (name, factory) in BUILTIN_STRATEGIES {
            registry.register(*name, *factory);
        }
        registry
    }

    /// Register a factory; an existing entry with the same name is replaced
    pub fn register(&mut self, name: impl Into<String>, factory: StrategyFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Identifiers of every registered strategy
    pub fn list_available(&self) -> BTreeSet<String> {
        self.factories.keys().cloned().collect()
    }

    /// Build the named strategy and make it active
    pub fn select(&mut self, name: &str) -> Result<()> {
        let Some(factory) = self.factories.get(name) else {
            warn!(
                strategy = %name,
                active = ?self.active_name(),
                "could not select strategy, keeping current one"
            );
            return Err(TraderError::StrategyNotFound(name.to_string()));
        };

        let strategy = factory(&self.params);
        self.active = Some(ActiveStrategy {
            name: name.to_string(),
            strategy,
        });
        info!(strategy = %name, "changed selected strategy");
        Ok(())
    }

    /// Identifier of the active strategy
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Run the active strategy; `None` when nothing is selected
    pub fn determine_action(&mut self, ctx: &StrategyContext) -> Option<StrategyAction> {
        self.active
            .as_mut()
            .and_then(|a| a.strategy.determine_action(ctx))
    }
}
