//! The backend contract shared by every backing strategy.

use memmap2::MmapMut;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mapped::MappedStorage;
use crate::view::{ByteView, ByteViewMut};
use crate::volatile::VolatileStorage;
use crate::{Result, StorageError};

/// Which memory a backend is carved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Anonymous memory, discarded on close.
    Volatile,
    /// A memory-mapped file that outlives the process.
    FileMapped,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volatile => f.write_str("volatile"),
            Self::FileMapped => f.write_str("file-mapped"),
        }
    }
}

/// Allocation state of a backend region.
#[derive(Debug)]
pub(crate) enum Region {
    /// `allocate` has not been called yet.
    Unallocated,
    /// Mapped region. `None` stands for a zero-length region, which cannot be
    /// mapped.
    Mapped(Option<MmapMut>),
    /// `close` has been called.
    Closed,
}

impl Region {
    pub(crate) fn bytes(&self) -> Result<&[u8]> {
        match self {
            Self::Unallocated => Err(StorageError::NotAllocated),
            Self::Closed => Err(StorageError::Closed),
            Self::Mapped(Some(map)) => Ok(&map[..]),
            Self::Mapped(None) => Ok(&[]),
        }
    }

    pub(crate) fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        match self {
            Self::Unallocated => Err(StorageError::NotAllocated),
            Self::Closed => Err(StorageError::Closed),
            Self::Mapped(Some(map)) => Ok(&mut map[..]),
            Self::Mapped(None) => Ok(&mut []),
        }
    }
}

/// A growable, byte-addressable region.
///
/// `allocate` must be called once before any other access. `resize` builds a
/// fresh region and swaps it in only after the old content has been carried
/// over, so a failed resize leaves the backend as it was. `close` is
/// idempotent; any access after it fails with
/// [`StorageError::Closed`](crate::StorageError::Closed).
///
/// Backends do no locking of their own. The owning structure serializes
/// access.
pub trait StorageBackend: Send {
    /// Size the region for the first time.
    fn allocate(&mut self, bytes: u64) -> Result<()>;

    /// Grow the region to `new_bytes`, preserving `[0, capacity())`.
    ///
    /// Shrinking is rejected; resizing to the current capacity is a no-op.
    fn resize(&mut self, new_bytes: u64) -> Result<()>;

    /// Read-only view over exactly `capacity()` bytes.
    fn view(&self) -> Result<ByteView<'_>>;

    /// Read/write view over exactly `capacity()` bytes.
    fn view_mut(&mut self) -> Result<ByteViewMut<'_>>;

    /// Current capacity in bytes.
    fn capacity(&self) -> u64;

    /// Bytes reserved by the backend, reported as memory usage.
    fn memory_usage(&self) -> u64 {
        self.capacity()
    }

    /// The backing strategy.
    fn kind(&self) -> StorageKind;

    /// Push dirty pages to the backing medium, if there is one.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the region. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Whether `close` has been called.
    fn is_closed(&self) -> bool;
}

/// Either backend, chosen once at construction.
#[derive(Debug)]
pub enum AnyStorage {
    /// Anonymous memory.
    Volatile(VolatileStorage),
    /// Memory-mapped file.
    FileMapped(MappedStorage),
}

impl From<VolatileStorage> for AnyStorage {
    fn from(storage: VolatileStorage) -> Self {
        Self::Volatile(storage)
    }
}

impl From<MappedStorage> for AnyStorage {
    fn from(storage: MappedStorage) -> Self {
        Self::FileMapped(storage)
    }
}

macro_rules! dispatch {
    ($self:ident, $storage:ident => $body:expr) => {
        match $self {
            AnyStorage::Volatile($storage) => $body,
            AnyStorage::FileMapped($storage) => $body,
        }
    };
}

impl StorageBackend for AnyStorage {
    fn allocate(&mut self, bytes: u64) -> Result<()> {
        dispatch!(self, s => s.allocate(bytes))
    }

    fn resize(&mut self, new_bytes: u64) -> Result<()> {
        dispatch!(self, s => s.resize(new_bytes))
    }

    fn view(&self) -> Result<ByteView<'_>> {
        dispatch!(self, s => s.view())
    }

    fn view_mut(&mut self) -> Result<ByteViewMut<'_>> {
        dispatch!(self, s => s.view_mut())
    }

    fn capacity(&self) -> u64 {
        dispatch!(self, s => s.capacity())
    }

    fn kind(&self) -> StorageKind {
        dispatch!(self, s => s.kind())
    }

    fn flush(&mut self) -> Result<()> {
        dispatch!(self, s => s.flush())
    }

    fn close(&mut self) -> Result<()> {
        dispatch!(self, s => s.close())
    }

    fn is_closed(&self) -> bool {
        dispatch!(self, s => s.is_closed())
    }
}
