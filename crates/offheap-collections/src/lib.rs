//! Collections whose elements live in raw byte regions instead of the heap.
//!
//! Elements are encoded through a pluggable [`Codec`] and packed into a
//! [`StorageBackend`](offheap_storage::StorageBackend) region, either
//! anonymous memory or a memory-mapped file. Only small index arrays (list
//! offsets, map bucket heads) stay on the heap.
//!
//! - [`OffHeapList`]: ordered, variable-length packed array
//! - [`OffHeapHashMap`]: chained hash table stored entirely in the region
//! - [`OffHeapHashSet`]: key-only adapter over the map
//! - [`Shared`]: cloneable, lock-guarded handle for multi-threaded use
//!
//! Space vacated by removed map records is never reclaimed; list removal
//! compacts the tail in place.
//!
//! # Example
//!
//! ```rust
//! use offheap_collections::{CollectionConfig, OffHeapHashMap, BinCodec, Utf8Codec};
//! use offheap_storage::VolatileStorage;
//!
//! # fn example() -> offheap_collections::Result<()> {
//! let mut map = OffHeapHashMap::new(
//!     VolatileStorage::new(),
//!     Utf8Codec,
//!     BinCodec::<u32>::new(),
//!     &CollectionConfig::default(),
//! )?;
//!
//! map.put("One".to_string(), 1)?;
//! assert_eq!(map.get(&"One".to_string())?, Some(1));
//! map.close()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use thiserror::Error;

// Element encoding
pub mod codec;

// Construction parameters
pub mod config;

// Operation metrics
pub mod stats;

// Packed list
pub mod list;

// Chained hash map
pub mod map;

// Set adapter
pub mod set;

// Lock-guarded handles
pub mod shared;

mod growth;

pub use codec::{BinCodec, BytesCodec, Codec, CodecError, JsonCodec, UnitCodec, Utf8Codec};
pub use config::CollectionConfig;
pub use list::OffHeapList;
pub use map::OffHeapHashMap;
pub use set::OffHeapHashSet;
pub use shared::Shared;
pub use stats::{CollectionStats, OperationMetrics};

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors raised by collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Index outside the valid range for the operation. Raised before any
    /// mutation.
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// Length of the collection at the time of the call.
        len: usize,
    },

    /// The backend failed to allocate, resize or perform I/O.
    #[error("Storage error: {0}")]
    Storage(#[from] offheap_storage::StorageError),

    /// An element could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Construction parameters were rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `close` was called on a shared handle while other handles exist.
    #[error("Collection is still shared by {0} other handle(s)")]
    StillShared(usize),
}
