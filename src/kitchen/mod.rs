//! Kitchen Module
//!
//! This module drives the storage engine the way a kitchen does: it places
//! incoming orders, makes room on the shelf when everything is full, and
//! picks orders up for delivery. Each step is reported to an action ledger.
//!
//! ## Architecture
//!
//! ```text
//!   place_order / pickup_order
//!          │
//!          ▼
//! ┌─────────────────┐        ┌─────────────────┐
//! │    Kitchen      │───────>│  ActionSink     │  (PLACE / MOVE / PICKUP / DISCARD)
//! │                 │        └─────────────────┘
//! │  - policy       │
//! │  - pickup       │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use hotshelf::kitchen::{ActionType, Kitchen, MemoryLedger};
//! use hotshelf::storage::StorageEngine;
//! use hotshelf::{Order, StorageType, Temperature};
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let kitchen = Kitchen::new(Arc::new(StorageEngine::new()), ledger.clone());
//!
//! let soup = Order::new("o1", "Soup", Temperature::Hot, 300, 0);
//! assert_eq!(kitchen.place_order(soup), Ok(StorageType::Heater));
//! assert_eq!(kitchen.pickup_order("o1"), Some(ActionType::Pickup));
//! assert_eq!(ledger.len(), 2);
//! ```

pub mod handler;
pub mod ledger;

// Re-export the kitchen and its ledger types
pub use handler::{Kitchen, PlacementError};
pub use ledger::{Action, ActionSink, ActionType, MemoryLedger};
