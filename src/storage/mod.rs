//! Storage Engine Module
//!
//! This module provides the core storage functionality for hotshelf:
//! three bounded pools with per-order freshness tracking and a soonest-to-expire
//! index over the overflow shelf.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────────────────────┐  │
//! │  │ HEATER   │  │ COOLER   │  │ SHELF                     │  │
//! │  │ Mutex    │  │ Mutex    │  │ Mutex                     │  │
//! │  │ (cap 6)  │  │ (cap 6)  │  │ (cap 12) + ExpiryIndex    │  │
//! │  └──────────┘  └──────────┘  └───────────────────────────┘  │
//! │         each pool: members + DecayLedger partition          │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ now_micros()
//!              ┌─────────────┴─────────────┐
//!              │          Clock            │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Per-Pool Locks**: independent pools never block each other
//! - **Bounded Admission**: every pool refuses orders beyond its capacity
//! - **Lazy Decay**: freshness is settled when an order is touched, at the rate
//!   of the pool it was in
//! - **Soonest-First Eviction**: O(log n) choice of the shelf order to discard
//!
//! ## Example
//!
//! ```
//! use hotshelf::storage::{now_micros, StorageEngine};
//! use hotshelf::{Order, StorageType, Temperature};
//!
//! let engine = StorageEngine::new();
//!
//! // Cooler order parked on the shelf
//! let ice = Order::new("c1", "Ice", Temperature::Cold, 60, now_micros());
//! assert!(engine.try_add(StorageType::Shelf, ice));
//!
//! // The cooler has room, so it goes home
//! let moved = engine.try_move_one_from_overflow().unwrap();
//! assert_eq!(moved.to, StorageType::Cooler);
//! ```

pub mod clock;
pub mod config;
pub mod decay;
pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use clock::{now_micros, Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StorageConfig};
pub use decay::{decay_rate, Decay, DecayLedger};
pub use engine::{StorageEngine, StorageStats};
pub use expiry::ExpiryIndex;
