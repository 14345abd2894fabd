//! Decay Ledger
//!
//! Every tracked order owns a freshness budget that shrinks with time.
//! How fast it shrinks depends on where the order sits: at rate 1 in its
//! ideal pool, at rate 2 anywhere else.
//!
//! ## Lazy Settlement
//!
//! There is no background ticker. A [`Decay`] record remembers when it was
//! last settled; whenever the engine touches the order (admit, move, remove)
//! it charges the elapsed interval at the rate of the pool the order occupied
//! during that interval and moves the settlement point to "now".
//!
//! ```text
//!  placed        admitted to shelf       moved to cooler        picked up
//!    │──── rate 2 (shelf) ────│──── rate 2 ────│──── rate 1 (cooler) ────│
//!    ▼                        ▼                ▼                         ▼
//! remaining = budget - 2·t1 - 2·t2 - 1·t3
//! ```
//!
//! Records live in a [`DecayLedger`], an id-keyed map. The engine keeps one
//! ledger per pool behind that pool's lock and hands a record over when the
//! order moves, so a record is only ever mutated under the lock of the pool
//! that currently holds the order.

use crate::model::{Order, StorageType, Temperature};
use std::collections::HashMap;

/// Decay multiplier in the ideal pool
pub const IDEAL_RATE: i64 = 1;

/// Decay multiplier outside the ideal pool
pub const NON_IDEAL_RATE: i64 = 2;

/// Returns how many microseconds of budget one microsecond in `pool` costs.
#[inline]
pub fn decay_rate(temp: Temperature, pool: StorageType) -> i64 {
    if temp.ideal_storage() == pool {
        IDEAL_RATE
    } else {
        NON_IDEAL_RATE
    }
}

/// Freshness state of one tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decay {
    /// Remaining budget in microseconds; negative once overdue
    pub remaining_micros: i64,
    /// Time of the last settlement (microseconds since the Unix epoch)
    pub last_update_micros: i64,
}

impl Decay {
    /// Starts tracking an order: full budget, settled at its placement time.
    pub fn start(order: &Order) -> Self {
        Self {
            remaining_micros: order.freshness_micros(),
            last_update_micros: order.placed_at_micros,
        }
    }

    /// Charges the time since the last settlement at `rate`.
    ///
    /// A clock reading older than the last settlement charges nothing.
    pub fn settle(&mut self, rate: i64, now: i64) {
        let elapsed = now.saturating_sub(self.last_update_micros).max(0);
        self.remaining_micros = self
            .remaining_micros
            .saturating_sub(elapsed.saturating_mul(rate));
        self.last_update_micros = self.last_update_micros.max(now);
    }

    /// Returns the state this record would have if settled at `now`.
    pub fn settled(mut self, rate: i64, now: i64) -> Self {
        self.settle(rate, now);
        self
    }

    /// True once the budget is used up.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.remaining_micros <= 0
    }

    /// Absolute time the budget runs out if the order stays at `rate`.
    pub fn predicted_expiry(&self, rate: i64, now: i64) -> i64 {
        now.saturating_add(self.remaining_micros.max(0) / rate.max(1))
    }
}

/// Id-keyed decay records for the orders of one pool.
#[derive(Debug, Default)]
pub struct DecayLedger {
    records: HashMap<String, Decay>,
}

impl DecayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the record for `id`.
    pub fn insert(&mut self, id: String, decay: Decay) {
        self.records.insert(id, decay);
    }

    pub fn get(&self, id: &str) -> Option<&Decay> {
        self.records.get(id)
    }

    /// Removes and returns the record for `id`.
    pub fn remove(&mut self, id: &str) -> Option<Decay> {
        self.records.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
