//! Anonymous-memory backend.
//!
//! Regions come from `mmap(MAP_ANONYMOUS)` via `memmap2`, so they sit outside
//! the Rust allocator and start zero-filled. Nothing survives `close`.

use memmap2::MmapMut;
use tracing::debug;

use crate::backend::{Region, StorageBackend, StorageKind};
use crate::view::{ByteView, ByteViewMut};
use crate::{Result, StorageError};

/// Backend over anonymous memory.
#[derive(Debug)]
pub struct VolatileStorage {
    region: Region,
    capacity: u64,
}

impl VolatileStorage {
    /// Create an unallocated backend.
    pub const fn new() -> Self {
        Self {
            region: Region::Unallocated,
            capacity: 0,
        }
    }

    fn map_anon(bytes: u64) -> Result<Option<MmapMut>> {
        if bytes == 0 {
            return Ok(None);
        }

        let len = usize::try_from(bytes).map_err(|_| {
            StorageError::Allocation(format!("{bytes} bytes exceeds the address space"))
        })?;

        MmapMut::map_anon(len)
            .map(Some)
            .map_err(|e| StorageError::Allocation(format!("failed to map {bytes} bytes: {e}")))
    }
}

impl Default for VolatileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for VolatileStorage {
    fn allocate(&mut self, bytes: u64) -> Result<()> {
        if matches!(self.region, Region::Closed) {
            return Err(StorageError::Closed);
        }

        // Re-allocation discards the previous region.
        self.region = Region::Mapped(Self::map_anon(bytes)?);
        self.capacity = bytes;
        debug!(bytes, "allocated volatile region");
        Ok(())
    }

    fn resize(&mut self, new_bytes: u64) -> Result<()> {
        let old = self.region.bytes()?;
        if new_bytes < self.capacity {
            return Err(StorageError::Allocation(format!(
                "cannot shrink region from {} to {new_bytes} bytes",
                self.capacity
            )));
        }
        if new_bytes == self.capacity {
            return Ok(());
        }

        let mut fresh = Self::map_anon(new_bytes)?;
        if let Some(map) = fresh.as_mut() {
            map[..old.len()].copy_from_slice(old);
        }

        debug!(
            old_bytes = self.capacity,
            new_bytes, "resized volatile region"
        );
        self.region = Region::Mapped(fresh);
        self.capacity = new_bytes;
        Ok(())
    }

    fn view(&self) -> Result<ByteView<'_>> {
        self.region.bytes().map(ByteView::new)
    }

    fn view_mut(&mut self) -> Result<ByteViewMut<'_>> {
        self.region.bytes_mut().map(ByteViewMut::new)
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Volatile
    }

    fn close(&mut self) -> Result<()> {
        if !matches!(self.region, Region::Closed) {
            debug!(bytes = self.capacity, "closed volatile region");
            self.region = Region::Closed;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        matches!(self.region, Region::Closed)
    }
}

impl Drop for VolatileStorage {
    fn drop(&mut self) {
        if matches!(self.region, Region::Mapped(_)) {
            debug!(
                bytes = self.capacity,
                "volatile region released without explicit close"
            );
        }
    }
}
