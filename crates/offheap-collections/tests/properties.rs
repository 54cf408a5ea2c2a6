//! Model-based property tests: every collection must behave like its std
//! counterpart under random operation sequences.

use std::collections::{HashMap, HashSet};

use offheap_collections::{
    BinCodec, BytesCodec, CollectionConfig, OffHeapHashMap, OffHeapHashSet, OffHeapList, Utf8Codec,
};
use offheap_storage::VolatileStorage;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

#[derive(Debug, Clone)]
enum ListOp {
    Insert(usize, Vec<u8>),
    Remove(usize),
    Set(usize, Vec<u8>),
}

fn list_op() -> impl Strategy<Value = ListOp> {
    let bytes = prop::collection::vec(any::<u8>(), 0..24);
    prop_oneof![
        3 => (any::<usize>(), bytes.clone()).prop_map(|(i, b)| ListOp::Insert(i, b)),
        2 => any::<usize>().prop_map(ListOp::Remove),
        1 => (any::<usize>(), bytes).prop_map(|(i, b)| ListOp::Set(i, b)),
    ]
}

#[derive(Debug, Clone)]
enum MapOp {
    Put(u16, String),
    Remove(u16),
}

fn map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        3 => (0u16..64, "[a-z]{0,12}").prop_map(|(k, v)| MapOp::Put(k, v)),
        1 => (0u16..64).prop_map(MapOp::Remove),
    ]
}

fn fail(e: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

proptest! {
    #[test]
    fn list_matches_vec_model(ops in prop::collection::vec(list_op(), 0..80)) {
        let mut list = OffHeapList::new(
            VolatileStorage::new(),
            BytesCodec,
            &CollectionConfig::new(2).with_bytes_per_element(4),
        ).map_err(fail)?;
        let mut model: Vec<Vec<u8>> = Vec::new();

        for op in ops {
            match op {
                ListOp::Insert(i, bytes) => {
                    let index = i % (model.len() + 1);
                    list.insert(index, bytes.clone()).map_err(fail)?;
                    model.insert(index, bytes);
                }
                ListOp::Remove(i) => {
                    if model.is_empty() {
                        prop_assert!(list.remove(0).is_err());
                        continue;
                    }
                    let index = i % model.len();
                    prop_assert_eq!(list.remove(index).map_err(fail)?, model.remove(index));
                }
                ListOp::Set(i, bytes) => {
                    if model.is_empty() {
                        prop_assert!(list.set(0, bytes).is_err());
                        continue;
                    }
                    let index = i % model.len();
                    let previous = list.set(index, bytes.clone()).map_err(fail)?;
                    prop_assert_eq!(previous, std::mem::replace(&mut model[index], bytes));
                }
            }

            // The data region stays exactly as long as the live elements.
            let live: usize = model.iter().map(Vec::len).sum();
            prop_assert_eq!(list.data_len(), live as u64);
            prop_assert_eq!(list.len(), model.len());
        }

        let contents: Vec<Vec<u8>> = list.iter().collect::<Result<_, _>>().map_err(fail)?;
        prop_assert_eq!(contents, model);
    }

    #[test]
    fn map_matches_hashmap_model(ops in prop::collection::vec(map_op(), 0..120)) {
        let mut map = OffHeapHashMap::new(
            VolatileStorage::new(),
            BinCodec::<u16>::new(),
            Utf8Codec,
            &CollectionConfig::new(1).with_bytes_per_element(8),
        ).map_err(fail)?;
        let mut model: HashMap<u16, String> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    prop_assert_eq!(map.put(k, v.clone()).map_err(fail)?, model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(&k).map_err(fail)?, model.remove(&k));
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        for k in 0u16..64 {
            prop_assert_eq!(map.get(&k).map_err(fail)?, model.get(&k).cloned());
        }
        let entries: HashMap<u16, String> = map.iter().collect::<Result<_, _>>().map_err(fail)?;
        prop_assert_eq!(entries, model);
    }

    #[test]
    fn set_matches_hashset_model(values in prop::collection::vec(0u32..40, 0..100)) {
        let mut set = OffHeapHashSet::new(
            VolatileStorage::new(),
            BinCodec::<u32>::new(),
            &CollectionConfig::new(2),
        ).map_err(fail)?;
        let mut model = HashSet::new();

        for v in values {
            prop_assert_eq!(set.add(v).map_err(fail)?, model.insert(v));
        }

        prop_assert_eq!(set.len(), model.len());
        let elements: HashSet<u32> = set.iter().collect::<Result<_, _>>().map_err(fail)?;
        prop_assert_eq!(elements, model);
    }
}
