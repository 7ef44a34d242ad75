//! # Ledger Rebuild
//!
//! Pure fold of ledger entries into per-key balances.
//!
//! ## Ledger As Truth
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Materialized Balance vs Ledger                        │
//! │                                                                         │
//! │  The ledger is the source of truth. The balances table is a            │
//! │  materialized cache of it:                                             │
//! │                                                                         │
//! │     balance(key) == Σ delta of ledger entries for key                  │
//! │                                                                         │
//! │  This module implements that sum as a pure fold, which gives us:       │
//! │                                                                         │
//! │  1. A repair path: rebuild_from_ledger() in stockflow-db replaces      │
//! │     a tenant's balances with the fold of its ledger                    │
//! │  2. An independent consistency check: any disagreement between the     │
//! │     fold and the materialized rows is a bug, testable without          │
//! │     trusting the engine that wrote them                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconcile entries need no special casing: their recorded delta is
//! `target - previous`, so summing deltas lands on the target exactly.

use std::collections::HashMap;

use crate::types::{BalanceKey, LedgerEntry};

/// Folds ledger entries into the balance each key should hold.
///
/// Order-independent: addition commutes, so entries may be supplied in any
/// order. Entries without a governing location (malformed rows) are skipped.
pub fn rebuild_balances(entries: &[LedgerEntry]) -> HashMap<BalanceKey, i64> {
    let mut balances: HashMap<BalanceKey, i64> = HashMap::new();

    for entry in entries {
        if let Some(key) = entry.balance_key() {
            *balances.entry(key).or_insert(0) += entry.delta;
        }
    }

    balances
}

/// Returns the keys whose materialized quantity disagrees with the fold.
///
/// Keys present in only one of the two maps count as disagreements unless
/// the other side would be zero (a never-touched key and an absent row mean
/// the same thing).
pub fn diff_balances(
    materialized: &HashMap<BalanceKey, i64>,
    rebuilt: &HashMap<BalanceKey, i64>,
) -> Vec<BalanceKey> {
    let mut mismatches = Vec::new();

    for (key, quantity) in materialized {
        if rebuilt.get(key).copied().unwrap_or(0) != *quantity {
            mismatches.push(key.clone());
        }
    }
    for (key, quantity) in rebuilt {
        if *quantity != 0 && !materialized.contains_key(key) {
            mismatches.push(key.clone());
        }
    }

    mismatches.sort();
    mismatches.dedup();
    mismatches
}

// =============================================================================
// Unit Tests
// =============================================================================
