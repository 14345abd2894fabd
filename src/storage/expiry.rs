//! Shelf Expiry Index
//!
//! When the shelf is full and nothing can be moved back to an ideal pool,
//! the engine evicts the shelf order that will spoil first. This module keeps
//! shelf orders sorted by their predicted expiry so that choice costs
//! O(log n) instead of a scan.
//!
//! ## Structure
//!
//! ```text
//!   by_expiry: BTreeMap<(expiry, seq), id>      by_id: HashMap<id, (expiry, seq)>
//!   ┌──────────────────────────────┐            ┌───────────────────────┐
//!   │ (1_002_000, 4) -> "fast"     │ <───────── │ "fast" -> (1_002_000, 4)
//!   │ (1_020_000, 5) -> "slow"     │ <───────── │ "slow" -> (1_020_000, 5)
//!   └──────────────────────────────┘            └───────────────────────┘
//! ```
//!
//! The second map gives removal by id without scanning. The admission
//! sequence number breaks ties, so two orders with the same predicted expiry
//! leave in the order they arrived.
//!
//! Predictions are made once, when an order is admitted to the shelf, assuming
//! it stays there. An order that leaves and comes back gets a fresh entry.

use std::collections::{BTreeMap, HashMap};

/// Ordering key of an index entry.
type Key = (i64, u64);

/// Min-ordered index of shelf orders by predicted expiry.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// Entries ordered by (predicted expiry, admission sequence)
    by_expiry: BTreeMap<Key, String>,
    /// Reverse lookup for removal by id
    by_id: HashMap<String, Key>,
    /// Next admission sequence number
    next_seq: u64,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `id` with a predicted expiry, replacing any previous entry.
    pub fn insert(&mut self, id: String, expires_at_micros: i64) {
        self.remove(&id);

        let key = (expires_at_micros, self.next_seq);
        self.next_seq += 1;

        self.by_expiry.insert(key, id.clone());
        self.by_id.insert(id, key);
    }

    /// Drops the entry for `id`, returning its predicted expiry.
    pub fn remove(&mut self, id: &str) -> Option<i64> {
        let key = self.by_id.remove(id)?;
        self.by_expiry.remove(&key);
        Some(key.0)
    }

    /// Removes and returns the entry that expires first.
    pub fn pop_min(&mut self) -> Option<(String, i64)> {
        let ((expires_at, _), id) = self.by_expiry.pop_first()?;
        self.by_id.remove(&id);
        Some((id, expires_at))
    }

    /// Predicted expiry of `id`, if indexed.
    pub fn expiry_of(&self, id: &str) -> Option<i64> {
        self.by_id.get(id).map(|(expires_at, _)| *expires_at)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
