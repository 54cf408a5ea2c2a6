//! Construction parameters shared by all collections

use serde::{Deserialize, Serialize};

use crate::{CollectionError, Result};

/// Construction parameters shared by all collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Initial element slots (list) or bucket count (map, set)
    pub initial_capacity: usize,

    /// Bytes reserved per initial slot when the backend is first allocated
    pub bytes_per_element: u64,

    /// Map fill ratio (`len / buckets`) at which the bucket array doubles
    pub load_factor: f64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            bytes_per_element: 1024, // 1 KB per element
            load_factor: 0.75,
        }
    }
}

impl CollectionConfig {
    /// Create a configuration with the given initial capacity
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Default::default()
        }
    }

    /// Set the initial capacity
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the per-slot byte reservation
    #[must_use]
    pub const fn with_bytes_per_element(mut self, bytes: u64) -> Self {
        self.bytes_per_element = bytes;
        self
    }

    /// Set the map load factor
    #[must_use]
    pub const fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Bytes requested from the backend at construction.
    pub fn initial_bytes(&self) -> u64 {
        (self.initial_capacity as u64).saturating_mul(self.bytes_per_element)
    }

    /// Reject unusable parameters.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(CollectionError::InvalidConfiguration(
                "initial_capacity must be at least 1".to_string(),
            ));
        }
        if self.bytes_per_element == 0 {
            return Err(CollectionError::InvalidConfiguration(
                "bytes_per_element must be at least 1".to_string(),
            ));
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(CollectionError::InvalidConfiguration(format!(
                "load_factor must be in (0, 1], got {}",
                self.load_factor
            )));
        }
        Ok(())
    }
}
