//! Chained hash map stored inside one backend region.
//!
//! Records (see [`record`]) are appended at the data tail and linked into
//! per-bucket singly linked chains through their `next` field. Only the
//! bucket-head array lives on the heap.
//!
//! Removed and relocated records stay in the region as orphaned bytes; the
//! map never compacts itself.

mod record;

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::time::Instant;

use offheap_storage::{AnyStorage, ByteView, StorageBackend, StorageError, StorageKind};
use tracing::{debug, trace};

use crate::codec::Codec;
use crate::config::CollectionConfig;
use crate::growth::ensure_capacity;
use crate::shared::Shared;
use crate::stats::{CollectionStats, OperationMetrics};
use crate::Result;

use record::{EncodedEntry, NEXT_OFFSET, NIL, RecordHeader};

/// Hash map whose entries live in a backend region.
///
/// Keys are compared by decoding the stored key bytes, so `KC` must encode
/// equal keys to bytes that decode back to equal keys.
pub struct OffHeapHashMap<K, V, KC, VC, B = AnyStorage, S = RandomState> {
    storage: B,
    key_codec: KC,
    value_codec: VC,
    hash_builder: S,
    buckets: Vec<u64>,
    len: usize,
    data_offset: u64,
    load_factor: f64,
    resize_threshold: usize,
    metrics: OperationMetrics,
    _marker: PhantomData<fn() -> (K, V)>,
}

/// A matched record and its position in the chain.
#[derive(Debug, Clone, Copy)]
struct Located {
    bucket: usize,
    prev: Option<u64>,
    header: RecordHeader,
}

#[allow(clippy::cast_precision_loss)]
fn resize_threshold(buckets: usize, load_factor: f64) -> usize {
    (buckets as f64 * load_factor).ceil() as usize
}

fn bucket_for(hash: u32, buckets: usize) -> usize {
    (u64::from(hash) % buckets as u64) as usize
}

impl<K, V, KC, VC, B> OffHeapHashMap<K, V, KC, VC, B, RandomState>
where
    K: Hash + Eq,
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
{
    /// Allocate `backend` and build an empty map with a random hasher.
    pub fn new(backend: B, key_codec: KC, value_codec: VC, config: &CollectionConfig) -> Result<Self> {
        Self::with_hasher(backend, key_codec, value_codec, RandomState::new(), config)
    }
}

impl<K, V, KC, VC, B, S> OffHeapHashMap<K, V, KC, VC, B, S>
where
    K: Hash + Eq,
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
    S: BuildHasher,
{
    /// Allocate `backend` and build an empty map hashing with `hash_builder`.
    ///
    /// `config.initial_capacity` is the initial bucket count.
    pub fn with_hasher(
        mut backend: B,
        key_codec: KC,
        value_codec: VC,
        hash_builder: S,
        config: &CollectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        backend.allocate(config.initial_bytes())?;

        debug!(
            kind = %backend.kind(),
            buckets = config.initial_capacity,
            bytes = config.initial_bytes(),
            "created off-heap hash map"
        );

        Ok(Self {
            storage: backend,
            key_codec,
            value_codec,
            hash_builder,
            buckets: vec![NIL; config.initial_capacity],
            len: 0,
            data_offset: 0,
            load_factor: config.load_factor,
            resize_threshold: resize_threshold(config.initial_capacity, config.load_factor),
            metrics: OperationMetrics::new(),
            _marker: PhantomData,
        })
    }

    /// Insert or replace the value for `key`, returning the previous value.
    ///
    /// A replacement of the same encoded length is written in place; any
    /// other length appends a fresh record and orphans the old one.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        let start = Instant::now();
        let result = self.put_entry(&key, &value);
        self.metrics.record_since(start);
        result
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let start = Instant::now();
        let result = self.lookup(key);
        self.metrics.record_since(start);
        result
    }

    /// Whether `key` has a mapping.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let start = Instant::now();
        let result = self
            .locate(key, self.hash_key(key))
            .map(|found| found.is_some());
        self.metrics.record_since(start);
        result
    }

    /// Remove the mapping for `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let start = Instant::now();
        let result = self.remove_entry(key);
        self.metrics.record_since(start);
        result
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current size of the bucket-head array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bytes appended to the region so far, orphaned records included.
    pub fn data_len(&self) -> u64 {
        self.data_offset
    }

    /// Backing strategy of this map.
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

    /// Entries in bucket order, then chain order.
    ///
    /// The order changes after a rehash. The iterator stops after yielding
    /// the first error.
    pub fn iter(&self) -> Iter<'_, K, V, KC, VC, B, S> {
        Iter {
            map: self,
            records: Records::new(&self.storage, &self.buckets),
        }
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> Keys<'_, K, V, KC, VC, B, S> {
        Keys {
            map: self,
            records: Records::new(&self.storage, &self.buckets),
        }
    }

    /// Values in iteration order.
    pub fn values(&self) -> Values<'_, K, V, KC, VC, B, S> {
        Values {
            map: self,
            records: Records::new(&self.storage, &self.buckets),
        }
    }

    /// Push dirty pages to the backing file, if any.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.storage.flush()?)
    }

    /// Release the backend.
    pub fn close(mut self) -> Result<()> {
        debug!(
            len = self.len,
            buckets = self.buckets.len(),
            bytes = self.data_offset,
            "closing off-heap hash map"
        );
        Ok(self.storage.close()?)
    }

    /// Wrap the map in a lock-guarded, cloneable handle.
    pub fn into_shared(self) -> Shared<Self> {
        Shared::new(self)
    }

    fn hash_key(&self, key: &K) -> u32 {
        let hash = self.hash_builder.hash_one(key);
        (hash ^ (hash >> 32)) as u32
    }

    fn locate(&self, key: &K, hash: u32) -> Result<Option<Located>> {
        let bucket = bucket_for(hash, self.buckets.len());
        let view = self.storage.view()?;

        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while cursor != NIL {
            let header = RecordHeader::read(&view, cursor)?;
            if header.hash == hash {
                let stored = self.key_codec.decode(header.key_bytes(&view)?)?;
                if stored == *key {
                    return Ok(Some(Located {
                        bucket,
                        prev,
                        header,
                    }));
                }
            }
            prev = Some(cursor);
            cursor = header.next;
        }

        Ok(None)
    }

    fn decode_value(&self, header: &RecordHeader) -> Result<V> {
        let view = self.storage.view()?;
        Ok(self.value_codec.decode(header.value_bytes(&view)?)?)
    }

    fn lookup(&self, key: &K) -> Result<Option<V>> {
        match self.locate(key, self.hash_key(key))? {
            Some(found) => self.decode_value(&found.header).map(Some),
            None => Ok(None),
        }
    }

    fn put_entry(&mut self, key: &K, value: &V) -> Result<Option<V>> {
        let entry = EncodedEntry::new(self.key_codec.encode(key)?, self.value_codec.encode(value)?)?;
        let hash = self.hash_key(key);

        if let Some(found) = self.locate(key, hash)? {
            let previous = self.decode_value(&found.header)?;

            if found.header.val_len as usize == entry.value.len() {
                self.storage
                    .view_mut()?
                    .write_bytes(found.header.val_start(), &entry.value)?;
            } else {
                trace!(
                    offset = found.header.offset,
                    old_len = found.header.val_len,
                    new_len = entry.value.len(),
                    "relocating map record"
                );
                // Reserve first so the old record is only unlinked once the
                // replacement is guaranteed to fit.
                self.reserve(entry.record_len())?;
                self.unlink(&found)?;
                self.append(found.bucket, hash, &entry)?;
            }

            return Ok(Some(previous));
        }

        if self.len >= self.resize_threshold {
            self.rehash()?;
        }

        let bucket = bucket_for(hash, self.buckets.len());
        self.append(bucket, hash, &entry)?;
        self.len += 1;
        Ok(None)
    }

    fn remove_entry(&mut self, key: &K) -> Result<Option<V>> {
        let Some(found) = self.locate(key, self.hash_key(key))? else {
            return Ok(None);
        };

        let value = self.decode_value(&found.header)?;
        self.unlink(&found)?;
        self.len -= 1;
        Ok(Some(value))
    }

    /// Grow the backend so `additional` bytes fit past the data tail.
    fn reserve(&mut self, additional: u64) -> Result<u64> {
        let end = self.data_offset.checked_add(additional).ok_or_else(|| {
            StorageError::Allocation(format!("map data would exceed {} bytes", u64::MAX))
        })?;
        ensure_capacity(&mut self.storage, end)?;
        Ok(end)
    }

    /// Write `entry` at the data tail as the new head of `bucket`.
    fn append(&mut self, bucket: usize, hash: u32, entry: &EncodedEntry) -> Result<u64> {
        let end = self.reserve(entry.record_len())?;
        let offset = self.data_offset;

        entry.write(&mut self.storage.view_mut()?, offset, hash, self.buckets[bucket])?;
        self.buckets[bucket] = offset;
        self.data_offset = end;
        Ok(offset)
    }

    fn unlink(&mut self, found: &Located) -> Result<()> {
        match found.prev {
            Some(prev) => self
                .storage
                .view_mut()?
                .write_u64(prev + NEXT_OFFSET, found.header.next)?,
            None => self.buckets[found.bucket] = found.header.next,
        }
        Ok(())
    }

    /// Double the bucket array, copying every live record to the data tail.
    ///
    /// The new bucket array is swapped in only after every record has been
    /// copied, so a failure leaves the map on its old chains.
    fn rehash(&mut self) -> Result<()> {
        let new_count = self.buckets.len().checked_mul(2).ok_or_else(|| {
            StorageError::Allocation("bucket array cannot grow further".to_string())
        })?;
        let mut fresh = vec![NIL; new_count];
        let bytes_before = self.data_offset;
        let mut moved = 0usize;

        for bucket in 0..self.buckets.len() {
            let mut cursor = self.buckets[bucket];
            while cursor != NIL {
                let header = RecordHeader::read(&self.storage.view()?, cursor)?;
                let dest = self.data_offset;
                let end = self.reserve(header.total_len())?;
                let target = bucket_for(header.hash, new_count);

                let mut view = self.storage.view_mut()?;
                view.copy_within(cursor..cursor + header.total_len(), dest)?;
                view.write_u64(dest + NEXT_OFFSET, fresh[target])?;
                fresh[target] = dest;
                self.data_offset = end;

                cursor = header.next;
                moved += 1;
            }
        }

        debug!(
            old_buckets = self.buckets.len(),
            new_buckets = new_count,
            records = moved,
            copied_bytes = self.data_offset - bytes_before,
            "rehashed off-heap hash map"
        );

        self.buckets = fresh;
        self.resize_threshold = resize_threshold(new_count, self.load_factor);
        Ok(())
    }
}

impl<K, V, KC, VC, B: StorageBackend, S> fmt::Debug for OffHeapHashMap<K, V, KC, VC, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffHeapHashMap")
            .field("kind", &self.storage.kind())
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .field("data_len", &self.data_offset)
            .field("capacity", &self.storage.capacity())
            .finish_non_exhaustive()
    }
}

impl<'a, K, V, KC, VC, B, S> IntoIterator for &'a OffHeapHashMap<K, V, KC, VC, B, S>
where
    K: Hash + Eq,
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
    S: BuildHasher,
{
    type Item = Result<(K, V)>;
    type IntoIter = Iter<'a, K, V, KC, VC, B, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks every chain in bucket order.
struct Records<'a, B> {
    storage: &'a B,
    buckets: &'a [u64],
    bucket: usize,
    cursor: u64,
    failed: bool,
}

impl<'a, B: StorageBackend> Records<'a, B> {
    fn new(storage: &'a B, buckets: &'a [u64]) -> Self {
        Self {
            storage,
            buckets,
            bucket: 0,
            cursor: NIL,
            failed: false,
        }
    }

    fn next_header(&mut self) -> Option<Result<(ByteView<'a>, RecordHeader)>> {
        while !self.failed {
            if self.cursor != NIL {
                let (storage, cursor) = (self.storage, self.cursor);
                let item = storage
                    .view()
                    .and_then(|view| RecordHeader::read(&view, cursor).map(|h| (view, h)));

                return Some(match item {
                    Ok((view, header)) => {
                        self.cursor = header.next;
                        Ok((view, header))
                    }
                    Err(e) => {
                        self.failed = true;
                        Err(e.into())
                    }
                });
            }

            let head = self.buckets.get(self.bucket)?;
            self.cursor = *head;
            self.bucket += 1;
        }
        None
    }

    /// Decode the next record with `decode`, fusing on the first error.
    fn next_with<R>(
        &mut self,
        decode: impl FnOnce(ByteView<'a>, RecordHeader) -> Result<R>,
    ) -> Option<Result<R>> {
        let item = self
            .next_header()?
            .and_then(|(view, header)| decode(view, header));
        self.failed = item.is_err();
        Some(item)
    }
}

/// Iterator returned by [`OffHeapHashMap::iter`].
pub struct Iter<'a, K, V, KC, VC, B, S> {
    map: &'a OffHeapHashMap<K, V, KC, VC, B, S>,
    records: Records<'a, B>,
}

impl<K, V, KC, VC, B, S> Iterator for Iter<'_, K, V, KC, VC, B, S>
where
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        self.records.next_with(|view, header| {
            let key = map.key_codec.decode(header.key_bytes(&view)?)?;
            let value = map.value_codec.decode(header.value_bytes(&view)?)?;
            Ok((key, value))
        })
    }
}

impl<K, V, KC, VC, B, S> FusedIterator for Iter<'_, K, V, KC, VC, B, S>
where
    KC: Codec<K>,
    VC: Codec<V>,
    B: StorageBackend,
{
}

/// Iterator returned by [`OffHeapHashMap::keys`].
pub struct Keys<'a, K, V, KC, VC, B, S> {
    map: &'a OffHeapHashMap<K, V, KC, VC, B, S>,
    records: Records<'a, B>,
}

impl<K, V, KC, VC, B, S> Iterator for Keys<'_, K, V, KC, VC, B, S>
where
    KC: Codec<K>,
    B: StorageBackend,
{
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        self.records
            .next_with(|view, header| Ok(map.key_codec.decode(header.key_bytes(&view)?)?))
    }
}

impl<K, V, KC, VC, B, S> FusedIterator for Keys<'_, K, V, KC, VC, B, S>
where
    KC: Codec<K>,
    B: StorageBackend,
{
}

/// Iterator returned by [`OffHeapHashMap::values`].
pub struct Values<'a, K, V, KC, VC, B, S> {
    map: &'a OffHeapHashMap<K, V, KC, VC, B, S>,
    records: Records<'a, B>,
}

impl<K, V, KC, VC, B, S> Iterator for Values<'_, K, V, KC, VC, B, S>
where
    VC: Codec<V>,
    B: StorageBackend,
{
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        self.records
            .next_with(|view, header| Ok(map.value_codec.decode(header.value_bytes(&view)?)?))
    }
}

impl<K, V, KC, VC, B, S> FusedIterator for Values<'_, K, V, KC, VC, B, S>
where
    VC: Codec<V>,
    B: StorageBackend,
{
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CollectionError;
    use crate::codec::{BinCodec, CodecError, Utf8Codec};
    use offheap_storage::VolatileStorage;
    use std::collections::HashMap;
    use std::hash::{BuildHasherDefault, Hasher};

    /// Sends every key to the same hash so chains get long.
    #[derive(Default)]
    struct CollidingHasher;

    impl Hasher for CollidingHasher {
        fn finish(&self) -> u64 {
            42
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    type Colliding = BuildHasherDefault<CollidingHasher>;

    type StringMap<S = RandomState> =
        OffHeapHashMap<String, u32, Utf8Codec, BinCodec<u32>, VolatileStorage, S>;

    fn string_map(buckets: usize) -> StringMap {
        OffHeapHashMap::new(
            VolatileStorage::new(),
            Utf8Codec,
            BinCodec::new(),
            &CollectionConfig::new(buckets).with_bytes_per_element(16),
        )
        .expect("create map")
    }

    fn colliding_map() -> StringMap<Colliding> {
        OffHeapHashMap::with_hasher(
            VolatileStorage::new(),
            Utf8Codec,
            BinCodec::new(),
            Colliding::default(),
            &CollectionConfig::new(4).with_load_factor(1.0),
        )
        .expect("create map")
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    fn snapshot<S: BuildHasher>(map: &StringMap<S>) -> HashMap<String, u32> {
        map.iter().collect::<Result<HashMap<_, _>>>().expect("iterate")
    }

    #[test]
    fn test_put_get_remove() {
        let mut map = string_map(16);
        assert_eq!(map.put(key("One"), 1).expect("put"), None);
        assert_eq!(map.put(key("Two"), 2).expect("put"), None);

        assert_eq!(map.get(&key("Two")).expect("get"), Some(2));
        assert_eq!(map.remove(&key("One")).expect("remove"), Some(1));
        assert_eq!(map.get(&key("One")).expect("get"), None);
        assert_eq!(map.remove(&key("One")).expect("remove again"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_same_length_update_is_in_place() {
        let mut map = string_map(16);
        map.put(key("k"), 1).expect("put");
        let bytes = map.data_len();

        assert_eq!(map.put(key("k"), 99).expect("update"), Some(1));
        assert_eq!(map.data_len(), bytes, "no new record appended");
        assert_eq!(map.get(&key("k")).expect("get"), Some(99));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_length_change_relocates_record() {
        let mut map: OffHeapHashMap<String, String, _, _, VolatileStorage> = OffHeapHashMap::new(
            VolatileStorage::new(),
            Utf8Codec,
            Utf8Codec,
            &CollectionConfig::new(8),
        )
        .expect("create");

        map.put(key("k"), key("short")).expect("put");
        let bytes = map.data_len();

        assert_eq!(
            map.put(key("k"), key("much longer value")).expect("update"),
            Some(key("short"))
        );
        assert!(map.data_len() > bytes, "relocated record appended");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&key("k")).expect("get"), Some(key("much longer value")));
        assert_eq!(map.keys().count(), 1);
    }

    #[test]
    fn test_rehash_keeps_every_entry() {
        let mut map = string_map(2);
        for i in 0..10u32 {
            map.put(format!("key-{i}"), i).expect("put");
        }

        assert!(map.bucket_count() > 2, "at least one rehash");
        assert_eq!(map.len(), 10);
        for i in 0..10u32 {
            assert_eq!(map.get(&format!("key-{i}")).expect("get"), Some(i));
        }
    }

    #[test]
    fn test_rehash_threshold() {
        let mut map = string_map(4);
        // 4 * 0.75 = 3 entries fit before the next insert rehashes.
        for i in 0..3u32 {
            map.put(format!("k{i}"), i).expect("put");
        }
        assert_eq!(map.bucket_count(), 4);

        map.put(key("k3"), 3).expect("put");
        assert_eq!(map.bucket_count(), 8);
    }

    #[test]
    fn test_colliding_chain_operations() {
        let mut map = colliding_map();
        for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            map.put(key(name), i as u32).expect("put");
        }

        // Remove from the middle, head and tail of the single chain.
        assert_eq!(map.remove(&key("b")).expect("remove"), Some(1));
        assert_eq!(map.remove(&key("d")).expect("remove head"), Some(3));
        assert_eq!(map.remove(&key("a")).expect("remove tail"), Some(0));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&key("c")).expect("get"), Some(2));
        assert!(!map.contains_key(&key("a")).expect("contains"));
        assert_eq!(snapshot(&map), HashMap::from([(key("c"), 2)]));
    }

    #[test]
    fn test_colliding_chain_survives_rehash() {
        let mut map = colliding_map();
        for i in 0..20u32 {
            map.put(format!("entry-{i}"), i).expect("put");
        }

        assert!(map.bucket_count() > 4);
        let expected: HashMap<String, u32> = (0..20).map(|i| (format!("entry-{i}"), i)).collect();
        assert_eq!(snapshot(&map), expected);
    }

    #[test]
    fn test_empty_key_and_value() {
        let mut map: OffHeapHashMap<String, String, _, _, VolatileStorage> = OffHeapHashMap::new(
            VolatileStorage::new(),
            Utf8Codec,
            Utf8Codec,
            &CollectionConfig::new(2),
        )
        .expect("create");

        map.put(String::new(), String::new()).expect("put empty");
        assert_eq!(map.get(&String::new()).expect("get"), Some(String::new()));
        assert!(map.contains_key(&String::new()).expect("contains"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_keys_and_values_agree_with_iter() {
        let mut map = string_map(8);
        for i in 0..6u32 {
            map.put(format!("n{i}"), i * 10).expect("put");
        }

        let entries: Vec<(String, u32)> = map.iter().collect::<Result<_>>().expect("iter");
        let keys: Vec<String> = map.keys().collect::<Result<_>>().expect("keys");
        let values: Vec<u32> = map.values().collect::<Result<_>>().expect("values");

        assert_eq!(entries.len(), 6);
        assert_eq!(keys, entries.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>());
        assert_eq!(values, entries.iter().map(|(_, v)| *v).collect::<Vec<_>>());
    }

    #[test]
    fn test_decode_failure_stops_iteration() {
        /// Decodes nothing successfully.
        struct BrokenValues;

        impl Codec<u32> for BrokenValues {
            fn encode(&self, value: &u32) -> std::result::Result<Vec<u8>, CodecError> {
                Ok(value.to_le_bytes().to_vec())
            }

            fn decode(&self, _bytes: &[u8]) -> std::result::Result<u32, CodecError> {
                Err(CodecError::Decode("corrupt".to_string()))
            }
        }

        let mut map: OffHeapHashMap<String, u32, _, _, VolatileStorage> = OffHeapHashMap::new(
            VolatileStorage::new(),
            Utf8Codec,
            BrokenValues,
            &CollectionConfig::new(4),
        )
        .expect("create");
        map.put(key("a"), 1).expect("put");
        map.put(key("b"), 2).expect("put");

        let items: Vec<_> = map.iter().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(CollectionError::Codec(_))));
        assert_eq!(map.keys().count(), 2, "keys decode independently");
    }

    #[test]
    fn test_stats_and_memory_usage() {
        let mut map = string_map(2);
        map.put(key("x"), 1).expect("put");
        map.get(&key("x")).expect("get");
        map.contains_key(&key("y")).expect("contains");
        map.remove(&key("x")).expect("remove");

        let stats = map.stats();
        assert_eq!(stats.operation_count, 4);
        assert_eq!(stats.memory_usage_bytes, map.memory_usage());
        assert!(map.is_empty());
        map.close().expect("close");
    }
}
