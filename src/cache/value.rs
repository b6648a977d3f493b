//! Cache value types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An application value as stored in and returned from the cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  Bytes(Vec<u8>),
  List(Vec<CacheValue>),
  Map(BTreeMap<String, CacheValue>),
}

impl CacheValue {
  pub fn is_null(&self) -> bool {
    matches!(self, CacheValue::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      CacheValue::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Render as JSON. Byte strings become text when they are valid UTF-8 and
  /// an array of numbers otherwise.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      CacheValue::Null => serde_json::Value::Null,
      CacheValue::Bool(b) => serde_json::Value::Bool(*b),
      CacheValue::Int(i) => serde_json::Value::Number((*i).into()),
      CacheValue::Float(f) => serde_json::Number::from_f64(*f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      CacheValue::Text(s) => serde_json::Value::String(s.clone()),
      CacheValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
        Ok(s) => serde_json::Value::String(s.to_string()),
        Err(_) => serde_json::Value::Array(bytes.iter().map(|b| (*b).into()).collect()),
      },
      CacheValue::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
      CacheValue::Map(map) => serde_json::Value::Object(
        map
          .iter()
          .map(|(k, v)| (k.clone(), v.to_json()))
          .collect(),
      ),
    }
  }

  /// Parse a command-line argument: integer first, then JSON, then plain text
  pub fn parse_arg(s: &str) -> Self {
    if let Ok(i) = s.parse::<i64>() {
      return CacheValue::Int(i);
    }
    match serde_json::from_str::<serde_json::Value>(s) {
      Ok(v) => CacheValue::from(v),
      Err(_) => CacheValue::Text(s.to_string()),
    }
  }
}

impl From<bool> for CacheValue {
  fn from(b: bool) -> Self {
    CacheValue::Bool(b)
  }
}

impl From<i64> for CacheValue {
  fn from(i: i64) -> Self {
    CacheValue::Int(i)
  }
}

impl From<i32> for CacheValue {
  fn from(i: i32) -> Self {
    CacheValue::Int(i.into())
  }
}

impl From<f64> for CacheValue {
  fn from(f: f64) -> Self {
    CacheValue::Float(f)
  }
}

impl From<String> for CacheValue {
  fn from(s: String) -> Self {
    CacheValue::Text(s)
  }
}

impl From<&str> for CacheValue {
  fn from(s: &str) -> Self {
    CacheValue::Text(s.to_string())
  }
}

impl From<Vec<u8>> for CacheValue {
  fn from(b: Vec<u8>) -> Self {
    CacheValue::Bytes(b)
  }
}

impl From<Vec<CacheValue>> for CacheValue {
  fn from(items: Vec<CacheValue>) -> Self {
    CacheValue::List(items)
  }
}

impl From<BTreeMap<String, CacheValue>> for CacheValue {
  fn from(map: BTreeMap<String, CacheValue>) -> Self {
    CacheValue::Map(map)
  }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(CacheValue::Null)
  }
}

impl From<serde_json::Value> for CacheValue {
  fn from(v: serde_json::Value) -> Self {
    match v {
      serde_json::Value::Null => CacheValue::Null,
      serde_json::Value::Bool(b) => CacheValue::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => CacheValue::Int(i),
        None => CacheValue::Float(n.as_f64().unwrap_or_default()),
      },
      serde_json::Value::String(s) => CacheValue::Text(s),
      serde_json::Value::Array(items) => {
        CacheValue::List(items.into_iter().map(CacheValue::from).collect())
      }
      serde_json::Value::Object(map) => CacheValue::Map(
        map
          .into_iter()
          .map(|(k, v)| (k, CacheValue::from(v)))
          .collect(),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_arg_prefers_integer() {
    assert_eq!(CacheValue::parse_arg("42"), CacheValue::Int(42));
    assert_eq!(CacheValue::parse_arg("-7"), CacheValue::Int(-7));
  }

  #[test]
  fn test_parse_arg_json_then_text() {
    assert_eq!(CacheValue::parse_arg("true"), CacheValue::Bool(true));
    assert_eq!(CacheValue::parse_arg("1.5"), CacheValue::Float(1.5));
    assert_eq!(
      CacheValue::parse_arg(r#"["a", 1]"#),
      CacheValue::List(vec![CacheValue::from("a"), CacheValue::Int(1)])
    );
    assert_eq!(
      CacheValue::parse_arg("hello world"),
      CacheValue::Text("hello world".into())
    );
  }

  #[test]
  fn test_to_json() {
    let mut map = BTreeMap::new();
    map.insert("name".to_string(), CacheValue::from("ada"));
    map.insert("tags".to_string(), CacheValue::List(vec![CacheValue::Int(1)]));
    assert_eq!(
      CacheValue::Map(map).to_json(),
      json!({"name": "ada", "tags": [1]})
    );
    assert_eq!(CacheValue::Bytes(b"abc".to_vec()).to_json(), json!("abc"));
    assert_eq!(CacheValue::Bytes(vec![0xff, 0x00]).to_json(), json!([255, 0]));
  }

  #[test]
  fn test_option_conversion() {
    assert_eq!(CacheValue::from(None::<i64>), CacheValue::Null);
    assert_eq!(CacheValue::from(Some("x")), CacheValue::Text("x".into()));
  }
}
