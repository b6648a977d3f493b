//! Key namespacing

use std::fmt;

/// Builds the stored key from a prefix, a version and the caller's key
pub type KeyFunction = fn(key: &str, prefix: &str, version: i64) -> String;

/// Namespaces caller keys as `prefix:version:key`
#[derive(Clone)]
pub struct KeyMaker {
  prefix: String,
  version: i64,
  key_func: KeyFunction,
}

impl KeyMaker {
  pub fn new(prefix: impl Into<String>, version: i64) -> Self {
    Self {
      prefix: prefix.into(),
      version,
      key_func: default_key_func,
    }
  }

  /// Replace the key layout
  pub fn with_key_function(mut self, key_func: KeyFunction) -> Self {
    self.key_func = key_func;
    self
  }

  /// Build the stored key; `version` overrides the default when given
  pub fn make_key(&self, key: &str, version: Option<i64>) -> String {
    (self.key_func)(key, &self.prefix, version.unwrap_or(self.version))
  }
}

impl Default for KeyMaker {
  fn default() -> Self {
    Self::new("", 1)
  }
}

impl fmt::Debug for KeyMaker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("KeyMaker")
      .field("prefix", &self.prefix)
      .field("version", &self.version)
      .finish()
  }
}

fn default_key_func(key: &str, prefix: &str, version: i64) -> String {
  format!("{}:{}:{}", prefix, version, key)
}
