//! Kitchen Orchestration
//!
//! The storage engine only offers primitives. This module strings them into
//! the placement policy and records each step in an action ledger.
//!
//! ## Placement Policy
//!
//! ```text
//! place(order)
//!   │
//!   ├─ ideal pool has room? ───────────────────────────> PLACE ideal
//!   │
//!   ├─ shelf has room? ────────────────────────────────> PLACE shelf
//!   │
//!   ├─ move one shelf order to its ideal pool? ─ MOVE ─┐
//!   │                                                  ├─> retry shelf ─> PLACE shelf
//!   └─ discard soonest-to-expire shelf order ─ DISCARD ┘
//! ```
//!
//! ## Pickup
//!
//! Orders only ever leave the shelf for their ideal pool, never the other way.
//! Pickup therefore looks on the shelf first and then in the other pools, which
//! cannot miss an order that is moved concurrently.

use crate::kitchen::ledger::{Action, ActionSink, ActionType};
use crate::model::{Admission, DiscardEvent, MoveEvent, Order, StorageType};
use crate::storage::StorageEngine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Places and picks up orders against a shared storage engine.
#[derive(Clone)]
pub struct Kitchen {
    /// The storage engine
    storage: Arc<StorageEngine>,
    /// Where actions are reported
    ledger: Arc<dyn ActionSink>,
}

impl std::fmt::Debug for Kitchen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kitchen")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl Kitchen {
    /// Creates a kitchen over `storage`, reporting to `ledger`.
    pub fn new(storage: Arc<StorageEngine>, ledger: Arc<dyn ActionSink>) -> Self {
        Self { storage, ledger }
    }

    /// Returns the underlying storage engine.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Places an order, making room on the shelf if necessary.
    ///
    /// The order is stamped with the current time before it is stored.
    ///
    /// # Returns
    ///
    /// The pool the order ended up in.
    ///
    /// # Errors
    ///
    /// - `PlacementError::Duplicate` if an order with this id is already stored
    /// - `PlacementError::ShelfContended` if another placement took the slot
    ///   freed for this one
    pub fn place_order(&self, order: Order) -> Result<StorageType, PlacementError> {
        let order = order.with_placed_at(self.storage.now_micros());
        let ideal = self.storage.ideal_for(order.temp);
        let shelf = StorageType::OVERFLOW;

        if self.admit(ideal, &order)? {
            return Ok(self.placed(&order, ideal));
        }

        if ideal != shelf && self.admit(shelf, &order)? {
            return Ok(self.placed(&order, shelf));
        }

        if let Some(event) = self.storage.try_move_one_from_overflow() {
            self.moved(&event);
        } else if let Some(event) = self.storage.discard_min_from_overflow() {
            self.discarded(&event);
        } else {
            debug!(id = %order.id, "Shelf full but nothing to move or discard");
        }

        if self.admit(shelf, &order)? {
            Ok(self.placed(&order, shelf))
        } else {
            warn!(id = %order.id, "Shelf slot taken by a concurrent placement");
            Err(PlacementError::ShelfContended(order.id))
        }
    }

    /// Tries one pool. `Ok(false)` means it was full.
    fn admit(&self, pool: StorageType, order: &Order) -> Result<bool, PlacementError> {
        match self.storage.try_admit(pool, order.clone()) {
            Admission::Admitted => Ok(true),
            Admission::Full => Ok(false),
            Admission::AlreadyStored(_) => Err(PlacementError::Duplicate(order.id.clone())),
        }
    }

    /// Picks up an order by id.
    ///
    /// # Returns
    ///
    /// - `Some(ActionType::Pickup)` if the order was still fresh
    /// - `Some(ActionType::Discard)` if it had spoiled
    /// - `None` if no pool holds it (already discarded or never placed)
    pub fn pickup_order(&self, id: &str) -> Option<ActionType> {
        let pools = [StorageType::OVERFLOW, StorageType::Heater, StorageType::Cooler];

        for pool in pools {
            let result = self.storage.remove_by_id(pool, id);
            if !result.removed {
                continue;
            }

            let action = if result.expired {
                ActionType::Discard
            } else {
                ActionType::Pickup
            };
            info!("{} id={} from {}", action, id, pool);
            self.record(id, action, pool);
            return Some(action);
        }

        info!("pickup: order {} not found, ignore", id);
        None
    }

    fn placed(&self, order: &Order, pool: StorageType) -> StorageType {
        info!("place id={} -> {}", order.id, pool);
        self.record(&order.id, ActionType::Place, pool);
        pool
    }

    fn moved(&self, event: &MoveEvent) {
        info!("move id={} {} -> {}", event.order.id, event.from, event.to);
        self.record(&event.order.id, ActionType::Move, event.to);
    }

    fn discarded(&self, event: &DiscardEvent) {
        info!("discard id={} from {}", event.order.id, event.from);
        self.record(&event.order.id, ActionType::Discard, event.from);
    }

    fn record(&self, id: &str, action: ActionType, target: StorageType) {
        self.ledger
            .record(Action::new(self.storage.now_micros(), id, action, target));
    }
}

/// Errors that can occur while placing an order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// An order with the same id is already stored
    #[error("order {0} is already placed")]
    Duplicate(String),

    /// The slot freed on the shelf was taken before this order could use it
    #[error("shelf capacity race while placing order {0}")]
    ShelfContended(String),
}
