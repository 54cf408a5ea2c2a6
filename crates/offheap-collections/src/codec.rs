//! Element encoding.
//!
//! A [`Codec`] turns elements into byte strings and back. Collections never
//! look inside the bytes; they only require that `decode(encode(x)) == x`.
//!
//! Stock codecs:
//!
//! | Codec          | Element          | Encoding                      |
//! |----------------|------------------|-------------------------------|
//! | [`Utf8Codec`]  | `String`         | raw UTF-8                     |
//! | [`BytesCodec`] | `Vec<u8>`        | identity                      |
//! | [`BinCodec`]   | binrw types      | little-endian binary (binrw)  |
//! | [`JsonCodec`]  | serde types      | JSON (serde_json)             |
//! | [`UnitCodec`]  | `()`             | zero bytes                    |

use binrw::{BinRead, BinWrite, Endian};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io::Cursor;
use std::marker::PhantomData;
use thiserror::Error;

/// Encode or decode failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The element could not be turned into bytes.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The stored bytes could not be turned back into an element.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Element ↔ bytes contract consumed by every collection.
pub trait Codec<T>: Send + Sync {
    /// Encode `value`.
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode a value previously produced by [`encode`](Self::encode).
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Approximate encoded length. A hint only; never used for layout.
    fn estimate_size(&self, value: &T) -> usize {
        self.encode(value).map_or(0, |bytes| bytes.len())
    }
}

/// Raw UTF-8 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Codec<String> for Utf8Codec {
    fn encode(&self, value: &String) -> Result<Vec<u8>, CodecError> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn estimate_size(&self, value: &String) -> usize {
        value.len()
    }
}

/// Byte vectors stored as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }

    fn estimate_size(&self, value: &Vec<u8>) -> usize {
        value.len()
    }
}

/// Zero-byte encoding of `()`, the hash set's sentinel value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCodec;

impl Codec<()> for UnitCodec {
    fn encode(&self, _value: &()) -> Result<Vec<u8>, CodecError> {
        Ok(Vec::new())
    }

    fn decode(&self, bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Decode(format!(
                "expected empty unit value, found {} bytes",
                bytes.len()
            )))
        }
    }

    fn estimate_size(&self, _value: &()) -> usize {
        0
    }
}

/// Little-endian binary encoding through `binrw`.
///
/// Works for any type readable and writable without arguments: primitive
/// integers and floats, fixed arrays of them, and `#[binrw]` structs.
pub struct BinCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BinCodec<T> {
    /// Create the codec.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BinCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BinCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BinCodec<T> {}

impl<T> fmt::Debug for BinCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BinCodec")
    }
}

impl<T> Codec<T> for BinCodec<T>
where
    T: for<'a> BinRead<Args<'a> = ()> + for<'a> BinWrite<Args<'a> = ()>,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut cursor = Cursor::new(Vec::new());
        value
            .write_options(&mut cursor, Endian::Little, ())
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let mut cursor = Cursor::new(bytes);
        let value = T::read_options(&mut cursor, Endian::Little, ())
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let consumed = cursor.position();
        if consumed != bytes.len() as u64 {
            return Err(CodecError::Decode(format!(
                "{} trailing bytes after value",
                bytes.len() as u64 - consumed
            )));
        }

        Ok(value)
    }
}

/// JSON encoding through `serde_json`.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create the codec.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        value: f64,
        tags: Vec<String>,
    }

    #[test]
    fn test_utf8_roundtrip() {
        let codec = Utf8Codec;
        let bytes = codec.encode(&"Off-Heap".to_string()).expect("encode");
        assert_eq!(bytes, b"Off-Heap");
        assert_eq!(codec.decode(&bytes).expect("decode"), "Off-Heap");
        assert_eq!(codec.estimate_size(&"abc".to_string()), 3);
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        let err = Utf8Codec.decode(&[0xFF, 0xFE]).expect_err("invalid utf-8");
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_unit_is_zero_length() {
        assert!(UnitCodec.encode(&()).expect("encode").is_empty());
        UnitCodec.decode(&[]).expect("decode empty");
        assert!(UnitCodec.decode(&[1]).is_err());
    }

    #[test]
    fn test_bin_codec_integers_are_little_endian() {
        let codec = BinCodec::<u32>::new();
        let bytes = codec.encode(&0x0102_0304).expect("encode");
        assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(codec.decode(&bytes).expect("decode"), 0x0102_0304);
    }

    #[test]
    fn test_bin_codec_rejects_short_and_trailing_input() {
        let codec = BinCodec::<u64>::new();
        assert!(codec.decode(&[1, 2, 3]).is_err());
        assert!(codec.decode(&[0; 9]).is_err());
    }

    #[test]
    fn test_json_codec_struct_roundtrip() {
        let codec = JsonCodec::<Reading>::new();
        let reading = Reading {
            sensor: "north-3".to_string(),
            value: 21.5,
            tags: vec!["indoor".to_string()],
        };

        let bytes = codec.encode(&reading).expect("encode");
        assert_eq!(codec.estimate_size(&reading), bytes.len());
        assert_eq!(codec.decode(&bytes).expect("decode"), reading);
    }

    #[test]
    fn test_json_codec_decode_error() {
        let codec = JsonCodec::<Reading>::new();
        assert!(matches!(codec.decode(b"{not json"), Err(CodecError::Decode(_))));
    }

    proptest! {
        #[test]
        fn utf8_codec_round_trips(s in ".*") {
            let codec = Utf8Codec;
            let bytes = codec.encode(&s).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(codec.decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?, s);
        }

        #[test]
        fn bin_codec_round_trips_i64(v in any::<i64>()) {
            let codec = BinCodec::<i64>::new();
            let bytes = codec.encode(&v).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(bytes.len(), 8);
            prop_assert_eq!(codec.decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?, v);
        }

        #[test]
        fn json_codec_round_trips_vectors(v in prop::collection::vec(any::<u16>(), 0..32)) {
            let codec = JsonCodec::<Vec<u16>>::new();
            let bytes = codec.encode(&v).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(codec.decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?, v);
        }
    }
}
