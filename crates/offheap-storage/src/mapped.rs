//! File-backed backend.
//!
//! The region is a shared, writable `memmap2` mapping of a regular file. The
//! OS pages it in and out on demand, so the region may exceed physical
//! memory. Bytes written through the view land in the file and survive the
//! process as long as the file is kept.

use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::{Region, StorageBackend, StorageKind};
use crate::view::{ByteView, ByteViewMut};
use crate::{Result, StorageError};

/// Backend over a memory-mapped file.
#[derive(Debug)]
pub struct MappedStorage {
    /// Path of the backing file.
    path: PathBuf,
    /// Open handle, `None` once closed.
    file: Option<File>,
    region: Region,
    capacity: u64,
}

impl MappedStorage {
    /// Open (creating if missing) the backing file at `path`.
    ///
    /// Nothing is mapped until [`allocate`](StorageBackend::allocate).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be opened for
    /// reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        debug!(path = %path.display(), "opened backing file");

        Ok(Self {
            path,
            file: Some(file),
            region: Region::Unallocated,
            capacity: 0,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(StorageError::Closed)
    }

    /// Make the file at least `bytes` long. Existing content is never cut.
    fn extend_file(&self, bytes: u64) -> Result<()> {
        let file = self.file()?;
        if file.metadata()?.len() < bytes {
            file.set_len(bytes).map_err(|e| {
                StorageError::Allocation(format!(
                    "failed to extend {} to {bytes} bytes: {e}",
                    self.path.display()
                ))
            })?;
        }
        Ok(())
    }

    fn map_file(&self, bytes: u64) -> Result<Option<MmapMut>> {
        if bytes == 0 {
            return Ok(None);
        }

        let len = usize::try_from(bytes).map_err(|_| {
            StorageError::Allocation(format!("{bytes} bytes exceeds the address space"))
        })?;
        let file = self.file()?;

        // SAFETY: the file is owned by this backend and only ever grows while
        // mapped, so the mapping never points past the end of the file.
        #[allow(unsafe_code)]
        let map = unsafe {
            MmapOptions::new().len(len).map_mut(file).map_err(|e| {
                StorageError::Allocation(format!(
                    "failed to map {bytes} bytes of {}: {e}",
                    self.path.display()
                ))
            })?
        };

        Ok(Some(map))
    }

    fn flush_region(&self) -> Result<()> {
        if let Region::Mapped(Some(map)) = &self.region {
            map.flush()?;
        }
        Ok(())
    }
}

impl StorageBackend for MappedStorage {
    fn allocate(&mut self, bytes: u64) -> Result<()> {
        if matches!(self.region, Region::Closed) {
            return Err(StorageError::Closed);
        }

        self.extend_file(bytes)?;
        let map = self.map_file(bytes)?;
        self.region = Region::Mapped(map);
        self.capacity = bytes;

        debug!(path = %self.path.display(), bytes, "allocated file-mapped region");
        Ok(())
    }

    fn resize(&mut self, new_bytes: u64) -> Result<()> {
        self.region.bytes()?;
        if new_bytes < self.capacity {
            return Err(StorageError::Allocation(format!(
                "cannot shrink region from {} to {new_bytes} bytes",
                self.capacity
            )));
        }
        if new_bytes == self.capacity {
            return Ok(());
        }

        // The file carries [0, old) into the fresh mapping; the old mapping is
        // only dropped once the new one exists.
        self.flush_region()?;
        self.extend_file(new_bytes)?;
        let fresh = self.map_file(new_bytes)?;

        debug!(
            path = %self.path.display(),
            old_bytes = self.capacity,
            new_bytes,
            "resized file-mapped region"
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
        StorageKind::FileMapped
    }

    fn flush(&mut self) -> Result<()> {
        self.region.bytes()?;
        self.flush_region()
    }

    fn close(&mut self) -> Result<()> {
        if matches!(self.region, Region::Closed) {
            return Ok(());
        }

        self.flush_region()?;
        self.region = Region::Closed;
        self.file = None;
        debug!(path = %self.path.display(), bytes = self.capacity, "closed file-mapped region");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        matches!(self.region, Region::Closed)
    }
}

impl Drop for MappedStorage {
    fn drop(&mut self) {
        if matches!(self.region, Region::Closed) {
            return;
        }

        let flushed = self.flush_region().is_ok();
        debug!(
            path = %self.path.display(),
            flushed,
            "file-mapped region released without explicit close"
        );
    }
}
