//! Domain Model
//!
//! Types shared by the storage engine and the kitchen that drives it.
//!
//! - `types`: orders, temperature classes and storage pools
//! - `events`: values returned by the engine's relief and removal operations
//!
//! An [`Order`] is supplied by the caller and never mutated by the engine.
//! Everything the engine derives from it (remaining freshness, predicted
//! expiry) lives inside the storage module, keyed by the order id.

pub mod events;
pub mod types;

// Re-export commonly used types for convenience
pub use events::{Admission, DiscardEvent, MoveEvent, RemoveResult};
pub use types::{Order, ParseError, StorageType, Temperature};
