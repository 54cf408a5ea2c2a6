//! Ordered list of variable-length elements packed into one backend region.
//!
//! Element `i` occupies `[offsets[i], offsets[i + 1])`, the last element ends
//! at the append cursor. The data region has no gaps: insert shifts the tail
//! right to open room, remove shifts it left to close the hole.
//!
//! ```text
//! offsets:  [0]      [5]            [13]
//!            |        |              |
//! region:   |Hello   |Off-Heap      |Tail  |........ unused ........|
//!                                          ^ data_offset
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::time::Instant;

use offheap_storage::{AnyStorage, StorageBackend, StorageKind};
use tracing::{debug, trace};

use crate::codec::Codec;
use crate::config::CollectionConfig;
use crate::growth::ensure_capacity;
use crate::shared::Shared;
use crate::stats::{CollectionStats, OperationMetrics};
use crate::{CollectionError, Result};

/// Ordered, variable-length packed array.
///
/// Indexing is O(1); insert and remove anywhere but the tail are O(n) in the
/// bytes that follow the index.
pub struct OffHeapList<T, C, B = AnyStorage> {
    storage: B,
    codec: C,
    offsets: Vec<u64>,
    data_offset: u64,
    metrics: OperationMetrics,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C, B> OffHeapList<T, C, B>
where
    C: Codec<T>,
    B: StorageBackend,
{
    /// Allocate `backend` and build an empty list over it.
    pub fn new(mut backend: B, codec: C, config: &CollectionConfig) -> Result<Self> {
        config.validate()?;
        backend.allocate(config.initial_bytes())?;

        debug!(
            kind = %backend.kind(),
            initial_capacity = config.initial_capacity,
            bytes = config.initial_bytes(),
            "created off-heap list"
        );

        Ok(Self {
            storage: backend,
            codec,
            offsets: Vec::with_capacity(config.initial_capacity),
            data_offset: 0,
            metrics: OperationMetrics::new(),
            _marker: PhantomData,
        })
    }

    /// Decode the element at `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        let start = Instant::now();
        let result = self.read_element(index);
        self.metrics.record_since(start);
        result
    }

    /// Insert `element` at `index`, shifting later elements right.
    ///
    /// `index == len()` appends.
    pub fn insert(&mut self, index: usize, element: T) -> Result<()> {
        let start = Instant::now();
        let result = self.check_insert_index(index).and_then(|()| {
            let bytes = self.codec.encode(&element)?;
            self.insert_encoded(index, &bytes)
        });
        self.metrics.record_since(start);
        result
    }

    /// Append `element`.
    pub fn push(&mut self, element: T) -> Result<()> {
        self.insert(self.offsets.len(), element)
    }

    /// Remove and return the element at `index`, shifting later elements left.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let start = Instant::now();
        let result = self.remove_element(index);
        self.metrics.record_since(start);
        result
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// Runs as a remove followed by an insert; the new bytes are not
    /// guaranteed to reuse the old slot. The replacement is encoded first, so
    /// an encode failure leaves the list untouched.
    pub fn set(&mut self, index: usize, element: T) -> Result<T> {
        let start = Instant::now();
        let result = self.check_index(index).and_then(|()| {
            let bytes = self.codec.encode(&element)?;
            let previous = self.remove_element(index)?;
            self.insert_encoded(index, &bytes)?;
            Ok(previous)
        });
        self.metrics.record_since(start);
        result
    }

    /// Lazy, ordered iterator over the elements.
    ///
    /// Each step decodes through [`get`](Self::get). The iterator stops after
    /// yielding the first error.
    pub fn iter(&self) -> Iter<'_, T, C, B> {
        Iter {
            list: self,
            index: 0,
            failed: false,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Live bytes in the data region; also the append cursor.
    pub fn data_len(&self) -> u64 {
        self.data_offset
    }

    /// Slots in the offset index before it has to grow.
    pub fn index_capacity(&self) -> usize {
        self.offsets.capacity()
    }

    /// Backing strategy of this list.
    pub fn storage_kind(&self) -> StorageKind {
        self.storage.kind()
    }

    /// Backend capacity in bytes.
    pub fn memory_usage(&self) -> u64 {
        self.storage.memory_usage()
    }

    /// Operation metrics snapshot.
    pub fn stats(&self) -> CollectionStats {
        self.metrics.snapshot(self.storage.memory_usage())
    }

    /// Push dirty pages to the backing file, if any.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.storage.flush()?)
    }

    /// Release the backend.
    pub fn close(mut self) -> Result<()> {
        debug!(len = self.offsets.len(), bytes = self.data_offset, "closing off-heap list");
        Ok(self.storage.close()?)
    }

    /// Wrap the list in a lock-guarded, cloneable handle.
    pub fn into_shared(self) -> Shared<Self> {
        Shared::new(self)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.offsets.len();
        if index < len {
            Ok(())
        } else {
            Err(CollectionError::IndexOutOfBounds { index, len })
        }
    }

    fn check_insert_index(&self, index: usize) -> Result<()> {
        let len = self.offsets.len();
        if index <= len {
            Ok(())
        } else {
            Err(CollectionError::IndexOutOfBounds { index, len })
        }
    }

    /// Byte range `[start, end)` of element `index`. Caller checks the index.
    fn element_range(&self, index: usize) -> (u64, u64) {
        let start = self.offsets[index];
        let end = self
            .offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.data_offset);
        (start, end)
    }

    fn read_element(&self, index: usize) -> Result<T> {
        self.check_index(index)?;
        let (start, end) = self.element_range(index);
        let view = self.storage.view()?;
        let bytes = view.read_bytes(start, end - start)?;
        Ok(self.codec.decode(bytes)?)
    }

    fn insert_encoded(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        let len = bytes.len() as u64;
        let position = self
            .offsets
            .get(index)
            .copied()
            .unwrap_or(self.data_offset);

        let required = self.data_offset.checked_add(len).ok_or_else(|| {
            offheap_storage::StorageError::Allocation(format!(
                "list data would exceed {} bytes",
                u64::MAX
            ))
        })?;
        ensure_capacity(&mut self.storage, required)?;

        let mut view = self.storage.view_mut()?;
        if position < self.data_offset && len > 0 {
            trace!(
                from = position,
                to = position + len,
                bytes = self.data_offset - position,
                "shifting list tail right"
            );
            view.copy_within(position..self.data_offset, position + len)?;
        }
        view.write_bytes(position, bytes)?;

        if self.offsets.len() == self.offsets.capacity() {
            // Double the index explicitly rather than relying on Vec's policy.
            let additional = self.offsets.capacity().max(1);
            self.offsets.reserve_exact(additional);
        }
        self.offsets.insert(index, position);
        for offset in &mut self.offsets[index + 1..] {
            *offset += len;
        }
        self.data_offset = required;
        Ok(())
    }

    fn remove_element(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;
        let (start, end) = self.element_range(index);
        let removed = end - start;

        let mut view = self.storage.view_mut()?;
        let value = self.codec.decode(view.read_bytes(start, removed)?)?;

        if end < self.data_offset && removed > 0 {
            trace!(
                from = end,
                to = start,
                bytes = self.data_offset - end,
                "shifting list tail left"
            );
            view.copy_within(end..self.data_offset, start)?;
        }

        self.offsets.remove(index);
        for offset in &mut self.offsets[index..] {
            *offset -= removed;
        }
        self.data_offset -= removed;
        Ok(value)
    }
}

impl<T, C, B: StorageBackend> fmt::Debug for OffHeapList<T, C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffHeapList")
            .field("kind", &self.storage.kind())
            .field("len", &self.offsets.len())
            .field("data_len", &self.data_offset)
            .field("capacity", &self.storage.capacity())
            .finish_non_exhaustive()
    }
}

impl<'a, T, C, B> IntoIterator for &'a OffHeapList<T, C, B>
where
    C: Codec<T>,
    B: StorageBackend,
{
    type Item = Result<T>;
    type IntoIter = Iter<'a, T, C, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`OffHeapList::iter`].
pub struct Iter<'a, T, C, B> {
    list: &'a OffHeapList<T, C, B>,
    index: usize,
    failed: bool,
}

impl<T, C, B> Iterator for Iter<'_, T, C, B>
where
    C: Codec<T>,
    B: StorageBackend,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.list.len() {
            return None;
        }

        let item = self.list.get(self.index);
        self.index += 1;
        self.failed = item.is_err();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.list.len().saturating_sub(self.index);
        (0, Some(remaining))
    }
}

impl<T, C, B> FusedIterator for Iter<'_, T, C, B>
where
    C: Codec<T>,
    B: StorageBackend,
{
}
