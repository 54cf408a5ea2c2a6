//! Byte layout of a map record.
//!
//! All integers are little-endian:
//!
//! ```text
//! +0   hash      u32
//! +4   next      u64   offset of the next record in the chain, NIL ends it
//! +12  key_len   u32
//! +16  key       key_len bytes
//! +16+key_len    val_len u32
//! +20+key_len    value   val_len bytes
//! ```

use offheap_storage::{ByteView, ByteViewMut, StorageError};

use crate::codec::CodecError;

/// "No record" marker for chain links and bucket heads.
pub(crate) const NIL: u64 = u64::MAX;

const HASH_OFFSET: u64 = 0;
pub(crate) const NEXT_OFFSET: u64 = 4;
const KEY_LEN_OFFSET: u64 = 12;
const KEY_OFFSET: u64 = 16;

/// Fixed bytes per record besides key and value.
pub(crate) const RECORD_OVERHEAD: u64 = 20;

/// Decoded fixed fields of a record at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    pub offset: u64,
    pub hash: u32,
    pub next: u64,
    pub key_len: u32,
    pub val_len: u32,
}

impl RecordHeader {
    pub fn read(view: &ByteView<'_>, offset: u64) -> Result<Self, StorageError> {
        let hash = view.read_u32(offset + HASH_OFFSET)?;
        let next = view.read_u64(offset + NEXT_OFFSET)?;
        let key_len = view.read_u32(offset + KEY_LEN_OFFSET)?;
        let val_len = view.read_u32(offset + KEY_OFFSET + u64::from(key_len))?;

        Ok(Self {
            offset,
            hash,
            next,
            key_len,
            val_len,
        })
    }

    pub fn key_start(&self) -> u64 {
        self.offset + KEY_OFFSET
    }

    pub fn val_start(&self) -> u64 {
        self.key_start() + u64::from(self.key_len) + 4
    }

    /// Total bytes occupied, header included.
    pub fn total_len(&self) -> u64 {
        RECORD_OVERHEAD + u64::from(self.key_len) + u64::from(self.val_len)
    }

    pub fn key_bytes<'a>(&self, view: &ByteView<'a>) -> Result<&'a [u8], StorageError> {
        view.read_bytes(self.key_start(), u64::from(self.key_len))
    }

    pub fn value_bytes<'a>(&self, view: &ByteView<'a>) -> Result<&'a [u8], StorageError> {
        view.read_bytes(self.val_start(), u64::from(self.val_len))
    }
}

/// Encoded key and value, length-checked against the `u32` length fields.
#[derive(Debug)]
pub(crate) struct EncodedEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl EncodedEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Result<Self, CodecError> {
        check_field_len("key", &key)?;
        check_field_len("value", &value)?;
        Ok(Self { key, value })
    }

    pub fn record_len(&self) -> u64 {
        RECORD_OVERHEAD + self.key.len() as u64 + self.value.len() as u64
    }

    pub fn write(
        &self,
        view: &mut ByteViewMut<'_>,
        offset: u64,
        hash: u32,
        next: u64,
    ) -> Result<(), StorageError> {
        let key_len = self.key.len() as u64;
        view.write_u32(offset + HASH_OFFSET, hash)?;
        view.write_u64(offset + NEXT_OFFSET, next)?;
        view.write_u32(offset + KEY_LEN_OFFSET, self.key.len() as u32)?;
        view.write_bytes(offset + KEY_OFFSET, &self.key)?;
        view.write_u32(offset + KEY_OFFSET + key_len, self.value.len() as u32)?;
        view.write_bytes(offset + KEY_OFFSET + key_len + 4, &self.value)
    }
}

fn check_field_len(field: &str, bytes: &[u8]) -> Result<(), CodecError> {
    if u32::try_from(bytes.len()).is_err() {
        return Err(CodecError::Encode(format!(
            "{field} of {} bytes exceeds the record field limit",
            bytes.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_roundtrip() {
        let mut buf = vec![0u8; 64];
        let entry = EncodedEntry::new(b"One".to_vec(), vec![1, 0, 0, 0]).expect("entry");
        assert_eq!(entry.record_len(), 27);

        entry
            .write(&mut ByteViewMut::new(&mut buf), 8, 0xABCD, NIL)
            .expect("write");

        let view = ByteView::new(&buf);
        let header = RecordHeader::read(&view, 8).expect("read");
        assert_eq!(header.hash, 0xABCD);
        assert_eq!(header.next, NIL);
        assert_eq!(header.key_len, 3);
        assert_eq!(header.val_len, 4);
        assert_eq!(header.total_len(), 27);
        assert_eq!(header.key_bytes(&view).expect("key"), b"One");
        assert_eq!(header.value_bytes(&view).expect("value"), [1, 0, 0, 0]);
    }

    #[test]
    fn test_fixed_field_positions() {
        let mut buf = vec![0u8; 32];
        let entry = EncodedEntry::new(vec![0xAA], Vec::new()).expect("entry");
        entry
            .write(&mut ByteViewMut::new(&mut buf), 0, 7, 0x0102)
            .expect("write");

        assert_eq!(&buf[0..4], &7u32.to_le_bytes());
        assert_eq!(&buf[4..12], &0x0102u64.to_le_bytes());
        assert_eq!(&buf[12..16], &1u32.to_le_bytes());
        assert_eq!(buf[16], 0xAA);
        assert_eq!(&buf[17..21], &0u32.to_le_bytes());
    }

    #[test]
    fn test_truncated_record_is_an_error() {
        let buf = [0u8; 10];
        assert!(RecordHeader::read(&ByteView::new(&buf), 0).is_err());
    }
}
