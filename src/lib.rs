//! # hotshelf - A Concurrent Storage Engine for Perishable Orders
//!
//! hotshelf tracks perishable orders across three bounded pools: a heater,
//! a cooler and a shelf that doubles as overflow for both. Every order loses
//! freshness at a rate that depends on where it sits, and the engine keeps
//! that bookkeeping exact while many workers place, move and pick up orders
//! at once.
//!
//! ## Features
//!
//! - **Bounded Pools**: each pool refuses admissions beyond its capacity
//! - **Per-Pool Locks**: independent pools never serialize each other
//! - **Lazy Decay**: freshness is settled on touch, at the rate of the pool the
//!   order actually occupied; no background ticker
//! - **Soonest-First Eviction**: shelf orders are indexed by predicted expiry
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              hotshelf                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐                                     │
//! │  │  Kitchen    │───>│ ActionSink  │                                     │
//! │  │  (policy)   │    │ (ledger)    │                                     │
//! │  └──────┬──────┘    └─────────────┘                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                       StorageEngine                              │   │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────────────────────────┐    │   │
//! │  │  │ Heater   │  │ Cooler   │  │ Shelf                        │    │   │
//! │  │  │ Mutex    │  │ Mutex    │  │ Mutex + ExpiryIndex          │    │   │
//! │  │  └──────────┘  └──────────┘  └──────────────────────────────┘    │   │
//! │  │          DecayLedger partition per pool, Clock for "now"         │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use hotshelf::storage::{now_micros, StorageEngine};
//! use hotshelf::{Order, StorageType, Temperature};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(StorageEngine::new());
//!
//! let ice = Order::new("c1", "Ice Cream", Temperature::Cold, 90, now_micros());
//! if !engine.try_add(StorageType::Cooler, ice.clone()) {
//!     assert!(engine.try_add(StorageType::Shelf, ice));
//! }
//!
//! let result = engine.remove_by_id(StorageType::Cooler, "c1");
//! assert!(result.removed && !result.expired);
//! ```
//!
//! ## Module Overview
//!
//! - [`model`]: orders, temperature classes, pools and engine results
//! - [`storage`]: the storage engine, decay ledger, expiry index and clock
//! - [`kitchen`]: placement policy and pickup on top of the engine
//!
//! ## Design Highlights
//!
//! ### Lock Ordering
//!
//! The only operation that holds two locks is the move off the shelf. It takes
//! the shelf lock first and only *tries* the destination lock, so it can never
//! wait on a worker that is itself waiting on the shelf.
//!
//! ### Decay Accounting
//!
//! An order's remaining freshness is its budget minus the sum, over every pool
//! it has occupied, of time spent there times that pool's rate (1 in the ideal
//! pool, 2 elsewhere).

pub mod kitchen;
pub mod model;
pub mod storage;

// Re-export commonly used types for convenience
pub use kitchen::{Action, ActionSink, ActionType, Kitchen, MemoryLedger, PlacementError};
pub use model::{Admission, DiscardEvent, MoveEvent, Order, RemoveResult, StorageType, Temperature};
pub use storage::{StorageConfig, StorageEngine, StorageStats};

/// Version of hotshelf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
