//! Pool Capacity Configuration
//!
//! Each pool has a fixed capacity chosen when the engine is built.
//! The defaults match a small kitchen: six slots in the heater, six in the
//! cooler and twelve on the shelf.
//!
//! ```
//! use hotshelf::storage::{StorageConfig, StorageEngine};
//!
//! let config = StorageConfig {
//!     shelf_capacity: 20,
//!     ..Default::default()
//! };
//! let engine = StorageEngine::with_config(config).unwrap();
//! assert_eq!(engine.capacity(hotshelf::StorageType::Shelf), 20);
//! ```

use crate::model::StorageType;

/// Default heater capacity
pub const DEFAULT_HEATER_CAPACITY: usize = 6;

/// Default cooler capacity
pub const DEFAULT_COOLER_CAPACITY: usize = 6;

/// Default shelf capacity
pub const DEFAULT_SHELF_CAPACITY: usize = 12;

/// Capacities for the three pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Maximum number of orders in the heater (default: 6)
    pub heater_capacity: usize,

    /// Maximum number of orders in the cooler (default: 6)
    pub cooler_capacity: usize,

    /// Maximum number of orders on the shelf (default: 12)
    pub shelf_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            heater_capacity: DEFAULT_HEATER_CAPACITY,
            cooler_capacity: DEFAULT_COOLER_CAPACITY,
            shelf_capacity: DEFAULT_SHELF_CAPACITY,
        }
    }
}

impl StorageConfig {
    /// Returns the configured capacity of `pool`.
    pub fn capacity(&self, pool: StorageType) -> usize {
        match pool {
            StorageType::Heater => self.heater_capacity,
            StorageType::Cooler => self.cooler_capacity,
            StorageType::Shelf => self.shelf_capacity,
        }
    }

    /// Checks that every pool can hold at least one order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pool in StorageType::ALL {
            if self.capacity(pool) == 0 {
                return Err(ConfigError::ZeroCapacity(pool));
            }
        }
        Ok(())
    }
}

/// Invalid storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("capacity of {0} must be at least 1")]
    ZeroCapacity(StorageType),
}
