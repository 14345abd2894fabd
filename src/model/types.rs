//! Order and Pool Types
//!
//! This module defines the value types the storage engine operates on.
//!
//! ## Temperature to Pool Mapping
//!
//! ```text
//! ┌─────────────┐        ┌─────────────┐
//! │    HOT      │───────>│   HEATER    │
//! ├─────────────┤        ├─────────────┤
//! │    COLD     │───────>│   COOLER    │
//! ├─────────────┤        ├─────────────┤
//! │    ROOM     │───────>│   SHELF     │<──── overflow for every class
//! └─────────────┘        └─────────────┘
//! ```
//!
//! Both enums render as lowercase tokens (`hot`, `shelf`, ...) and parse
//! case-insensitively from the same tokens.

use std::fmt;
use std::str::FromStr;

/// Temperature class of an order.
///
/// Fixed when the order is created. It determines the ideal pool and,
/// through it, how fast the order loses freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temperature {
    Hot,
    Cold,
    Room,
}

impl Temperature {
    /// All temperature classes.
    pub const ALL: [Temperature; 3] = [Temperature::Hot, Temperature::Cold, Temperature::Room];

    /// Returns the pool where this class decays at the normal rate.
    #[inline]
    pub fn ideal_storage(self) -> StorageType {
        match self {
            Temperature::Hot => StorageType::Heater,
            Temperature::Cold => StorageType::Cooler,
            Temperature::Room => StorageType::Shelf,
        }
    }

    /// Returns the lowercase token for this class.
    pub fn as_str(self) -> &'static str {
        match self {
            Temperature::Hot => "hot",
            Temperature::Cold => "cold",
            Temperature::Room => "room",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Temperature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(Temperature::Hot),
            "cold" => Ok(Temperature::Cold),
            "room" => Ok(Temperature::Room),
            _ => Err(ParseError::UnknownTemperature(s.to_string())),
        }
    }
}

/// One of the three bounded storage pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageType {
    /// Ideal for hot orders
    Heater,
    /// Ideal for cold orders
    Cooler,
    /// Ideal for room-temperature orders and overflow for everything else
    Shelf,
}

impl StorageType {
    /// All pools, in lock-table order.
    pub const ALL: [StorageType; 3] = [StorageType::Heater, StorageType::Cooler, StorageType::Shelf];

    /// The pool that absorbs orders whose ideal pool is full.
    pub const OVERFLOW: StorageType = StorageType::Shelf;

    /// Returns true for the overflow pool.
    #[inline]
    pub fn is_overflow(self) -> bool {
        self == Self::OVERFLOW
    }

    /// Position of this pool in per-pool tables.
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            StorageType::Heater => 0,
            StorageType::Cooler => 1,
            StorageType::Shelf => 2,
        }
    }

    /// Returns the lowercase token for this pool.
    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::Heater => "heater",
            StorageType::Cooler => "cooler",
            StorageType::Shelf => "shelf",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heater" => Ok(StorageType::Heater),
            "cooler" => Ok(StorageType::Cooler),
            "shelf" => Ok(StorageType::Shelf),
            _ => Err(ParseError::UnknownStorage(s.to_string())),
        }
    }
}

/// Errors produced when parsing domain tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown temperature '{0}'")]
    UnknownTemperature(String),

    #[error("unknown storage '{0}'")]
    UnknownStorage(String),
}

/// A perishable order.
///
/// Orders are immutable once handed to the engine. The engine tracks the
/// remaining freshness separately, so the same `Order` value can be cloned
/// into events without carrying mutable state along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique id, stable for the lifetime of the order
    pub id: String,
    /// Display name
    pub name: String,
    /// Temperature class
    pub temp: Temperature,
    /// Total freshness budget in seconds
    pub freshness_secs: u32,
    /// When the order first entered the kitchen (microseconds since the Unix epoch)
    pub placed_at_micros: i64,
}

impl Order {
    /// Creates a new order placed at `placed_at_micros`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        temp: Temperature,
        freshness_secs: u32,
        placed_at_micros: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            temp,
            freshness_secs,
            placed_at_micros,
        }
    }

    /// Returns a copy of this order stamped with a new placement time.
    pub fn with_placed_at(&self, placed_at_micros: i64) -> Self {
        Self {
            placed_at_micros,
            ..self.clone()
        }
    }

    /// Total freshness budget in microseconds.
    #[inline]
    pub fn freshness_micros(&self) -> i64 {
        i64::from(self.freshness_secs) * 1_000_000
    }

    /// The pool where this order decays at the normal rate.
    #[inline]
    pub fn ideal_storage(&self) -> StorageType {
        self.temp.ideal_storage()
    }
}
