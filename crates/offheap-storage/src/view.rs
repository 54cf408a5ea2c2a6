//! Bounds-checked byte access over a backend region.
//!
//! Integers are stored little-endian. Every access validates its range
//! against the region length and fails with [`StorageError::OutOfBounds`]
//! rather than panicking.

use std::ops::Range;

use crate::{Result, StorageError};

fn checked_range(offset: u64, len: u64, capacity: usize) -> Result<Range<usize>> {
    let out_of_bounds = || StorageError::OutOfBounds {
        offset,
        len,
        capacity: capacity as u64,
    };

    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > capacity as u64 {
        return Err(out_of_bounds());
    }

    Ok(offset as usize..end as usize)
}

/// Read-only view of a backend region.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Wrap a byte slice.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Length of the viewed region in bytes.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the viewed region is empty.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn read_bytes(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let range = checked_range(offset, len, self.bytes.len())?;
        Ok(&self.bytes[range])
    }

    /// Read a little-endian `u32` at `offset`.
    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes(offset, 4)?);
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a little-endian `u64` at `offset`.
    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(offset, 8)?);
        Ok(u64::from_le_bytes(buf))
    }
}

/// Read/write view of a backend region.
#[derive(Debug)]
pub struct ByteViewMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> ByteViewMut<'a> {
    /// Wrap a mutable byte slice.
    pub const fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Length of the viewed region in bytes.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the viewed region is empty.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> ByteView<'_> {
        ByteView::new(self.bytes)
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn read_bytes(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let range = checked_range(offset, len, self.bytes.len())?;
        Ok(&self.bytes[range])
    }

    /// Read a little-endian `u32` at `offset`.
    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        self.as_view().read_u32(offset)
    }

    /// Read a little-endian `u64` at `offset`.
    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        self.as_view().read_u64(offset)
    }

    /// Copy `data` into the region at `offset`.
    pub fn write_bytes(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let range = checked_range(offset, data.len() as u64, self.bytes.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Write a little-endian `u32` at `offset`.
    pub fn write_u32(&mut self, offset: u64, value: u32) -> Result<()> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write a little-endian `u64` at `offset`.
    pub fn write_u64(&mut self, offset: u64, value: u64) -> Result<()> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Move the bytes in `src` so they start at `dest`.
    ///
    /// Source and destination may overlap (memmove semantics).
    pub fn copy_within(&mut self, src: Range<u64>, dest: u64) -> Result<()> {
        let len = src.end.saturating_sub(src.start);
        let from = checked_range(src.start, len, self.bytes.len())?;
        checked_range(dest, len, self.bytes.len())?;
        self.bytes.copy_within(from, dest as usize);
        Ok(())
    }
}
