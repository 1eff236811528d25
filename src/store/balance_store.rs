//! Account balance state

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::types::{BalanceSnapshot, BalanceUpdate};

/// Ordered per-asset balances, one entry per asset
///
/// Writers build a complete new set and swap it in under the lock, so a
/// reader holding a [`BalanceStore::snapshot`] never sees a partially
/// applied replacement.
pub struct BalanceStore {
    snapshots: RwLock<Arc<Vec<BalanceSnapshot>>>,
}

impl BalanceStore {
    /// Create an empty store (no snapshot received yet)
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Replace every balance with a new set
    ///
    /// Duplicate assets collapse into one entry: the last value wins and the
    /// first position is kept.
    pub fn replace(&self, snapshots: Vec<BalanceSnapshot>) {
        let deduped = Arc::new(dedup_by_asset(snapshots));
        *self.snapshots.write() = deduped;
    }

    /// Apply incremental balance changes
    ///
    /// Known assets get their balance overwritten; unknown assets are appended.
    pub fn apply_updates(&self, updates: &[BalanceUpdate]) {
        if updates.is_empty() {
            return;
        }

        let mut guard = self.snapshots.write();
        let mut next: Vec<BalanceSnapshot> = (**guard).clone();
        for update in updates {
            match next.iter_mut().find(|s| s.asset == update.asset) {
                Some(existing) => existing.balance = update.balance,
                None => next.push(BalanceSnapshot::new(&update.asset, update.balance)),
            }
        }
        *guard = Arc::new(next);
    }

    /// Look up the balance of one asset
    pub fn lookup(&self, asset: &str) -> Option<BalanceSnapshot> {
        self.snapshots
            .read()
            .iter()
            .find(|s| s.asset == asset)
            .cloned()
    }

    /// The current balance set; stays consistent while held
    pub fn snapshot(&self) -> Arc<Vec<BalanceSnapshot>> {
        self.snapshots.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

impl Default for BalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_by_asset(snapshots: Vec<BalanceSnapshot>) -> Vec<BalanceSnapshot> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(snapshots.len());
    let mut out: Vec<BalanceSnapshot> = Vec::with_capacity(snapshots.len());

    for snapshot in snapshots {
        match positions.get(&snapshot.asset) {
            Some(&idx) => out[idx].balance = snapshot.balance,
            None => {
                positions.insert(snapshot.asset.clone(), out.len());
                out.push(snapshot);
            }
        }
    }

    out
}

/// Shared balance store handle
pub type SharedBalanceStore = Arc<BalanceStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_store_lookup_is_none() {
        let store = BalanceStore::new();
        assert!(store.is_empty());
        assert!(store.lookup("USD").is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = BalanceStore::new();
        store.replace(vec![
            BalanceSnapshot::new("USD", dec!(1000)),
            BalanceSnapshot::new("BTC", dec!(0.5)),
        ]);
        assert_eq!(store.len(), 2);

        store.replace(vec![BalanceSnapshot::new("ETH", dec!(3))]);
        assert_eq!(store.len(), 1);
        assert!(store.lookup("USD").is_none());
        assert_eq!(store.lookup("ETH").unwrap().balance, dec!(3));
    }

    #[test]
    fn test_replace_collapses_duplicates() {
        let store = BalanceStore::new();
        store.replace(vec![
            BalanceSnapshot::new("USD", dec!(10)),
            BalanceSnapshot::new("BTC", dec!(1)),
            BalanceSnapshot::new("USD", dec!(20)),
        ]);

        let snapshot = store.snapshot();
        assert_eq!(
            *snapshot,
            vec![
                BalanceSnapshot::new("USD", dec!(20)),
                BalanceSnapshot::new("BTC", dec!(1)),
            ]
        );
    }

    #[test]
    fn test_held_snapshot_is_not_mixed_with_replacement() {
        let store = BalanceStore::new();
        store.replace(vec![
            BalanceSnapshot::new("USD", dec!(1000)),
            BalanceSnapshot::new("BTC", dec!(1)),
        ]);

        let before = store.snapshot();
        store.replace(vec![BalanceSnapshot::new("EUR", dec!(5))]);

        assert_eq!(before.len(), 2);
        assert!(before.iter().all(|s| s.asset != "EUR"));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_apply_updates_upserts() {
        let store = BalanceStore::new();
        store.replace(vec![BalanceSnapshot::new("USD", dec!(1000))]);

        store.apply_updates(&[
            BalanceUpdate {
                asset: "USD".to_string(),
                balance: dec!(500),
                kind: Some("trade".to_string()),
            },
            BalanceUpdate {
                asset: "BTC".to_string(),
                balance: dec!(0.01),
                kind: Some("trade".to_string()),
            },
        ]);

        assert_eq!(store.lookup("USD").unwrap().balance, dec!(500));
        assert_eq!(store.lookup("BTC").unwrap().balance, dec!(0.01));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let store = Arc::new(BalanceStore::new());
        let set_a = vec![
            BalanceSnapshot::new("USD", dec!(1)),
            BalanceSnapshot::new("BTC", dec!(1)),
        ];
        let set_b = vec![
            BalanceSnapshot::new("EUR", dec!(2)),
            BalanceSnapshot::new("ETH", dec!(2)),
            BalanceSnapshot::new("SOL", dec!(2)),
        ];
        store.replace(set_a.clone());

        let writer = {
            let store = Arc::clone(&store);
            let (a, b) = (set_a.clone(), set_b.clone());
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    store.replace(if i % 2 == 0 { b.clone() } else { a.clone() });
                }
            })
        };

        for _ in 0..2_000 {
            let seen = store.snapshot();
            assert!(*seen == set_a || *seen == set_b);
        }
        writer.join().unwrap();
    }
}
