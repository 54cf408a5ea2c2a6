//! Raw, growable byte regions living outside the Rust heap.
//!
//! A [`StorageBackend`] is a contiguous byte region addressed by offset. Two
//! interchangeable backings are provided:
//!
//! - **Volatile** ([`VolatileStorage`]): anonymous memory, discarded on close
//! - **FileMapped** ([`MappedStorage`]): a memory-mapped file, paged by the OS,
//!   whose content outlives the process if the file is kept
//!
//! The backing is picked once at construction, either directly or through
//! [`StorageConfig`], which yields an [`AnyStorage`].
//!
//! # Example
//!
//! ```rust
//! use offheap_storage::{StorageBackend, VolatileStorage};
//!
//! # fn example() -> offheap_storage::Result<()> {
//! let mut storage = VolatileStorage::new();
//! storage.allocate(64)?;
//! storage.view_mut()?.write_u32(0, 0xCAFE)?;
//! storage.resize(128)?;
//! assert_eq!(storage.view()?.read_u32(0)?, 0xCAFE);
//! storage.close()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use thiserror::Error;

// Backend contract and static dispatch
pub mod backend;

// Bounds-checked byte access
pub mod view;

// Anonymous memory backing
pub mod volatile;

// File-backed backing
pub mod mapped;

// Backend selection
pub mod config;

pub use backend::{AnyStorage, StorageBackend, StorageKind};
pub use config::StorageConfig;
pub use mapped::MappedStorage;
pub use view::{ByteView, ByteViewMut};
pub use volatile::VolatileStorage;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not satisfy an `allocate` or `resize` request.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// The backing file could not be opened, extended, flushed or closed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The region was accessed before the first `allocate`.
    #[error("Storage accessed before allocation")]
    NotAllocated,

    /// The region was accessed after `close`.
    #[error("Storage accessed after close")]
    Closed,

    /// A read or write fell outside the allocated region.
    #[error("Access out of bounds: offset {offset} + {len} exceeds capacity {capacity}")]
    OutOfBounds {
        /// Start of the rejected access.
        offset: u64,
        /// Length of the rejected access.
        len: u64,
        /// Capacity of the region at the time of access.
        capacity: u64,
    },
}

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
