//! Hash set over [`OffHeapHashMap`] with a zero-length value.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use offheap_storage::{AnyStorage, StorageBackend, StorageKind};

use crate::Result;
use crate::codec::{Codec, UnitCodec};
use crate::config::CollectionConfig;
use crate::map::{Keys, OffHeapHashMap};
use crate::shared::Shared;
use crate::stats::CollectionStats;

/// Iterator returned by [`OffHeapHashSet::iter`].
pub type Iter<'a, T, C, B, S> = Keys<'a, T, (), C, UnitCodec, B, S>;

/// Hash set whose elements live in a backend region.
///
/// Each element is a map key whose value is `()`, stored as zero bytes.
pub struct OffHeapHashSet<T, C, B = AnyStorage, S = RandomState> {
    map: OffHeapHashMap<T, (), C, UnitCodec, B, S>,
}

impl<T, C, B> OffHeapHashSet<T, C, B, RandomState>
where
    T: Hash + Eq,
    C: Codec<T>,
    B: StorageBackend,
{
    /// Allocate `backend` and build an empty set with a random hasher.
    pub fn new(backend: B, codec: C, config: &CollectionConfig) -> Result<Self> {
        Ok(Self {
            map: OffHeapHashMap::new(backend, codec, UnitCodec, config)?,
        })
    }
}

impl<T, C, B, S> OffHeapHashSet<T, C, B, S>
where
    T: Hash + Eq,
    C: Codec<T>,
    B: StorageBackend,
    S: BuildHasher,
{
    /// Allocate `backend` and build an empty set hashing with `hash_builder`.
    pub fn with_hasher(
        backend: B,
        codec: C,
        hash_builder: S,
        config: &CollectionConfig,
    ) -> Result<Self> {
        Ok(Self {
            map: OffHeapHashMap::with_hasher(backend, codec, UnitCodec, hash_builder, config)?,
        })
    }

    /// Add `element`. Returns `false` if it was already present.
    pub fn add(&mut self, element: T) -> Result<bool> {
        Ok(self.map.put(element, ())?.is_none())
    }

    /// Whether `element` is present.
    pub fn contains(&self, element: &T) -> Result<bool> {
        self.map.contains_key(element)
    }

    /// Remove `element`. Returns `false` if it was absent.
    pub fn remove(&mut self, element: &T) -> Result<bool> {
        Ok(self.map.remove(element)?.is_some())
    }

    /// Elements in bucket order.
    pub fn iter(&self) -> Iter<'_, T, C, B, S> {
        self.map.keys()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Current size of the bucket-head array.
    pub fn bucket_count(&self) -> usize {
        self.map.bucket_count()
    }

    /// Backing strategy of this set.
    pub fn storage_kind(&self) -> StorageKind {
        self.map.storage_kind()
    }

    /// Backend capacity in bytes.
    pub fn memory_usage(&self) -> u64 {
        self.map.memory_usage()
    }

    /// Operation metrics snapshot.
    pub fn stats(&self) -> CollectionStats {
        self.map.stats()
    }

    /// Push dirty pages to the backing file, if any.
    pub fn flush(&mut self) -> Result<()> {
        self.map.flush()
    }

    /// Release the backend.
    pub fn close(self) -> Result<()> {
        self.map.close()
    }

    /// Wrap the set in a lock-guarded, cloneable handle.
    pub fn into_shared(self) -> Shared<Self> {
        Shared::new(self)
    }
}

impl<T, C, B: StorageBackend, S> fmt::Debug for OffHeapHashSet<T, C, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffHeapHashSet")
            .field("map", &self.map)
            .finish()
    }
}

impl<'a, T, C, B, S> IntoIterator for &'a OffHeapHashSet<T, C, B, S>
where
    T: Hash + Eq,
    C: Codec<T>,
    B: StorageBackend,
    S: BuildHasher,
{
    type Item = Result<T>;
    type IntoIter = Iter<'a, T, C, B, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
