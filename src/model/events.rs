//! Engine Result Types
//!
//! Capacity pressure and lock contention are expected outcomes, so the
//! engine reports them as values rather than errors:
//!
//! - `try_admit` returns an `Admission`
//! - `try_move_one_from_overflow` returns `Option<MoveEvent>`
//! - `discard_min_from_overflow` returns `Option<DiscardEvent>`
//! - `remove_by_id` returns a `RemoveResult`

use crate::model::{Order, StorageType};

/// Outcome of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The order is now a member of the pool
    Admitted,
    /// The pool is at capacity
    Full,
    /// The id is already tracked, in the given pool
    AlreadyStored(StorageType),
}

impl Admission {
    #[inline]
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// An order was relocated between pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub order: Order,
    pub from: StorageType,
    pub to: StorageType,
}

/// An order was evicted from a pool to make room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardEvent {
    pub order: Order,
    pub from: StorageType,
}

/// Outcome of removing an order by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveResult {
    /// The order was found in the pool and removed
    pub removed: bool,
    /// The order had no freshness left at the moment of removal
    pub expired: bool,
}

impl RemoveResult {
    /// The id was not a member of the pool.
    pub const NOT_FOUND: RemoveResult = RemoveResult {
        removed: false,
        expired: false,
    };

    /// The order was removed; `expired` reports its freshness at removal.
    pub fn removed(expired: bool) -> Self {
        Self {
            removed: true,
            expired,
        }
    }
}
