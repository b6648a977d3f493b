//! Value codec between application values and the byte-oriented store
//!
//! Integers are stored natively so the store's INCR/DECR operate on them.
//! Every other value, booleans included, is serialized with MessagePack.

use std::io::Cursor;
use thiserror::Error;

use super::value::CacheValue;
use crate::error::CacheResult;

/// A value in its stored form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
  Int(i64),
  Bytes(Vec<u8>),
}

impl EncodedValue {
  /// Classify a payload read back from the store. Canonical decimal integers
  /// are reported as `Int`, which is how the integer fast path and INCR/DECR
  /// leave them.
  pub fn from_stored(bytes: Vec<u8>) -> Self {
    match parse_canonical_int(&bytes) {
      Some(i) => EncodedValue::Int(i),
      None => EncodedValue::Bytes(bytes),
    }
  }

  /// Payload as written to the store
  pub fn to_wire(&self) -> Vec<u8> {
    match self {
      EncodedValue::Int(i) => i.to_string().into_bytes(),
      EncodedValue::Bytes(b) => b.clone(),
    }
  }

  /// An empty payload counts as a miss on read
  pub fn is_empty(&self) -> bool {
    matches!(self, EncodedValue::Bytes(b) if b.is_empty())
  }
}

/// Payload that does not hold a serialized cache value
#[derive(Debug, Error)]
pub enum DeserializationFailure {
  #[error("not a serialized cache value: {0}")]
  Malformed(#[from] rmp_serde::decode::Error),
  #[error("{0} trailing bytes after serialized cache value")]
  TrailingBytes(usize),
}

/// Encode a value for storage
pub fn encode(value: &CacheValue) -> CacheResult<EncodedValue> {
  match value {
    CacheValue::Int(i) => Ok(EncodedValue::Int(*i)),
    other => Ok(EncodedValue::Bytes(rmp_serde::to_vec(other)?)),
  }
}

/// Deserialize a stored byte payload, reporting why it is not a cache value
pub fn try_decode(bytes: &[u8]) -> Result<CacheValue, DeserializationFailure> {
  let mut cursor = Cursor::new(bytes);
  let value: CacheValue = rmp_serde::from_read(&mut cursor)?;
  let consumed = cursor.position() as usize;
  if consumed != bytes.len() {
    return Err(DeserializationFailure::TrailingBytes(bytes.len() - consumed));
  }
  Ok(value)
}

/// Decode a stored value. Payloads that fail to deserialize come back as
/// the raw bytes.
pub fn decode(raw: EncodedValue) -> CacheValue {
  match raw {
    EncodedValue::Int(i) => CacheValue::Int(i),
    EncodedValue::Bytes(bytes) => match try_decode(&bytes) {
      Ok(value) => value,
      Err(e) => {
        tracing::trace!("Returning raw bytes: {}", e);
        CacheValue::Bytes(bytes)
      }
    },
  }
}

fn parse_canonical_int(bytes: &[u8]) -> Option<i64> {
  let s = std::str::from_utf8(bytes).ok()?;
  let i = s.parse::<i64>().ok()?;
  (i.to_string() == s).then_some(i)
}
