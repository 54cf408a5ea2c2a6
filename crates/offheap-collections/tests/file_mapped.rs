//! Collections over memory-mapped files

use offheap_collections::{BinCodec, CollectionConfig, OffHeapHashMap, OffHeapList, Utf8Codec};
use offheap_storage::{MappedStorage, StorageConfig, StorageKind};
use tempfile::tempdir;

#[test]
fn test_list_on_file_grows_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("list.bin");

    let config = CollectionConfig::new(2).with_bytes_per_element(8);
    let mut list = OffHeapList::new(MappedStorage::open(&path).unwrap(), Utf8Codec, &config).unwrap();
    assert_eq!(list.storage_kind(), StorageKind::FileMapped);

    for i in 0..100 {
        list.push(format!("line {i}")).unwrap();
    }
    list.remove(0).unwrap();
    list.insert(0, "first".to_string()).unwrap();
    list.flush().unwrap();

    let file_len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(file_len, list.memory_usage());
    assert!(file_len >= list.data_len());

    assert_eq!(list.get(0).unwrap(), "first");
    assert_eq!(list.get(99).unwrap(), "line 99");
    list.close().unwrap();
}

#[test]
fn test_map_on_file_through_config() {
    let dir = tempdir().unwrap();
    let storage = StorageConfig::file_mapped(dir.path().join("map.bin"))
        .open()
        .unwrap();

    let mut map = OffHeapHashMap::new(
        storage,
        BinCodec::<u64>::new(),
        BinCodec::<u64>::new(),
        &CollectionConfig::new(4).with_bytes_per_element(16),
    )
    .unwrap();

    for i in 0..1000u64 {
        map.put(i, i * i).unwrap();
    }
    for i in (0..1000u64).step_by(3) {
        assert_eq!(map.remove(&i).unwrap(), Some(i * i));
    }

    assert_eq!(map.len(), 666);
    for i in 0..1000u64 {
        let expected = (i % 3 != 0).then_some(i * i);
        assert_eq!(map.get(&i).unwrap(), expected);
    }
    map.close().unwrap();
}
