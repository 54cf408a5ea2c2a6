//! Lock-guarded handles for multi-threaded use.
//!
//! A collection's mutators take `&mut self`, so sharing one across threads
//! needs a lock. [`Shared`] holds the collection behind one coarse
//! `parking_lot::Mutex`; every delegated call, reads included, takes it.
//!
//! ```rust
//! use offheap_collections::{CollectionConfig, OffHeapList, Utf8Codec};
//! use offheap_storage::VolatileStorage;
//! use std::thread;
//!
//! # fn example() -> offheap_collections::Result<()> {
//! let list = OffHeapList::new(VolatileStorage::new(), Utf8Codec, &CollectionConfig::default())?
//!     .into_shared();
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|t| {
//!         let list = list.clone();
//!         thread::spawn(move || list.push(format!("from-{t}")))
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().expect("worker panicked")?;
//! }
//!
//! assert_eq!(list.len(), 4);
//! list.close()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use offheap_storage::StorageBackend;
use parking_lot::{Mutex, MutexGuard};

use crate::codec::Codec;
use crate::list::OffHeapList;
use crate::map::OffHeapHashMap;
use crate::set::OffHeapHashSet;
use crate::stats::CollectionStats;
use crate::{CollectionError, Result};

/// Cloneable handle to a collection behind a single mutex.
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<T> Shared<T> {
    /// Wrap `collection`.
    pub fn new(collection: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    /// Take the lock for multi-step work, such as iterating.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Number of live handles, this one included.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Recover the collection if this is the last handle.
    pub fn try_into_inner(self) -> std::result::Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }

    fn into_last(self) -> Result<T> {
        self.try_into_inner()
            .map_err(|shared| CollectionError::StillShared(shared.handle_count() - 1))
    }
}

impl<T, C, B> Shared<OffHeapList<T, C, B>>
where
    C: Codec<T>,
    B: StorageBackend,
{
    /// See [`OffHeapList::get`].
    pub fn get(&self, index: usize) -> Result<T> {
        self.lock().get(index)
    }

    /// See [`OffHeapList::insert`].
    pub fn insert(&self, index: usize, element: T) -> Result<()> {
        self.lock().insert(index, element)
    }

    /// See [`OffHeapList::push`].
    pub fn push(&self, element: T) -> Result<()> {
        self.lock().push(element)
    }

    /// See [`OffHeapList::remove`].
    pub fn remove(&self, index: usize) -> Result<T> {
        self.lock().remove(index)
    }

    /// See [`OffHeapList::set`].
    pub fn set(&self, index: usize, element: T) -> Result<T> {
        self.lock().set(index, element)
    }

    /// See [`OffHeapList::len`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// See [`OffHeapList::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`OffHeapList::stats`].
    pub fn stats(&self) -> CollectionStats {
        self.lock().stats()
    }

    /// Close the list. Fails with [`CollectionError::StillShared`] while
    /// other handles exist.
    pub fn close(self) -> Result<()> {
        self.into_last()?.close()
    }
}

impl<K, V, KC, VC, B, S> Shared<OffHeapHashMap<K, V, KC, VC, B, S>>
where
    K: Hash + Eq,
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
    S: BuildHasher,
{
    /// See [`OffHeapHashMap::put`].
    pub fn put(&self, key: K, value: V) -> Result<Option<V>> {
        self.lock().put(key, value)
    }

    /// See [`OffHeapHashMap::get`].
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.lock().get(key)
    }

    /// See [`OffHeapHashMap::contains_key`].
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.lock().contains_key(key)
    }

    /// See [`OffHeapHashMap::remove`].
    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        self.lock().remove(key)
    }

    /// See [`OffHeapHashMap::len`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// See [`OffHeapHashMap::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`OffHeapHashMap::stats`].
    pub fn stats(&self) -> CollectionStats {
        self.lock().stats()
    }

    /// Close the map. Fails with [`CollectionError::StillShared`] while
    /// other handles exist.
    pub fn close(self) -> Result<()> {
        self.into_last()?.close()
    }
}

impl<T, C, B, S> Shared<OffHeapHashSet<T, C, B, S>>
where
    T: Hash + Eq,
    C: Codec<T>,
    B: StorageBackend,
    S: BuildHasher,
{
    /// See [`OffHeapHashSet::add`].
    pub fn add(&self, element: T) -> Result<bool> {
        self.lock().add(element)
    }

    /// See [`OffHeapHashSet::contains`].
    pub fn contains(&self, element: &T) -> Result<bool> {
        self.lock().contains(element)
    }

    /// See [`OffHeapHashSet::remove`].
    pub fn remove(&self, element: &T) -> Result<bool> {
        self.lock().remove(element)
    }

    /// See [`OffHeapHashSet::len`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// See [`OffHeapHashSet::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`OffHeapHashSet::stats`].
    pub fn stats(&self) -> CollectionStats {
        self.lock().stats()
    }

    /// Close the set. Fails with [`CollectionError::StillShared`] while
    /// other handles exist.
    pub fn close(self) -> Result<()> {
        self.into_last()?.close()
    }
}
