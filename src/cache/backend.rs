//! Cache operations façade
//!
//! Every operation namespaces the key, normalizes the timeout and runs
//! against a client picked for its role: `get` goes to a replica in
//! sentinel mode, everything else to the master.

use std::collections::HashMap;
use tracing::warn;

use super::codec::{decode, encode};
use super::config::BackendConfig;
use super::keys::KeyMaker;
use super::provider::{ConnectionProvider, Role};
use super::transport::RedisProvider;
use super::timeout::{compute_ttl, Timeout};
use super::value::CacheValue;
use crate::error::CacheResult;
use crate::settings::CacheSettings;

/// Default expiry in seconds
pub const DEFAULT_TIMEOUT: i64 = 300;

/// Key-value cache backed by a remote store
pub struct RedisCache<P = RedisProvider> {
  provider: P,
  keys: KeyMaker,
  default_timeout: Option<i64>,
}

impl RedisCache<RedisProvider> {
  /// Build the adapter from settings; no connection is made until first use
  pub fn new(settings: &CacheSettings) -> Self {
    let config = BackendConfig::parse(&settings.location, &settings.options);
    tracing::debug!(target_nodes = %config.target, group = %config.master_group, "Cache configured");
    Self::with_provider(
      RedisProvider::new(config),
      settings.key_maker(),
      settings.timeout,
    )
  }
}

impl<P: ConnectionProvider> RedisCache<P> {
  pub fn with_provider(provider: P, keys: KeyMaker, default_timeout: Option<i64>) -> Self {
    Self {
      provider,
      keys,
      default_timeout,
    }
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  pub fn make_key(&self, key: &str, version: Option<i64>) -> String {
    self.keys.make_key(key, version)
  }

  /// TTL sent to the store for `timeout`; `None` means no expiry
  pub fn backend_timeout(&self, timeout: Timeout) -> Option<u64> {
    compute_ttl(timeout, self.default_timeout)
  }

  /// Fetch a value. Missing and empty payloads are both a miss.
  pub fn get(&self, key: &str, version: Option<i64>) -> CacheResult<Option<CacheValue>> {
    let key = self.make_key(key, version);
    let raw = self.provider.with_client(Role::Read, |client| client.get(&key))?;
    Ok(match raw {
      Some(raw) if !raw.is_empty() => Some(decode(raw)),
      _ => None,
    })
  }

  /// Fetch a value, falling back to `default` on a miss
  pub fn get_or(
    &self,
    key: &str,
    default: impl Into<CacheValue>,
    version: Option<i64>,
  ) -> CacheResult<CacheValue> {
    Ok(self.get(key, version)?.unwrap_or_else(|| default.into()))
  }

  /// Store a value unconditionally. A store that reports the write as not
  /// applied gets an explicit delete so no stale value stays behind.
  pub fn set(
    &self,
    key: &str,
    value: impl Into<CacheValue>,
    timeout: Timeout,
    version: Option<i64>,
  ) -> CacheResult<()> {
    let key = self.make_key(key, version);
    let encoded = encode(&value.into())?;
    let ttl = self.backend_timeout(timeout);
    self.provider.with_client(Role::Write, |client| {
      if !client.set(&key, &encoded, ttl, false)? {
        warn!(key = %key, "SET was not applied, deleting key");
        client.delete(&key)?;
      }
      Ok(())
    })
  }

  /// Store a value only if the key does not exist. Returns whether it was
  /// stored.
  pub fn add(
    &self,
    key: &str,
    value: impl Into<CacheValue>,
    timeout: Timeout,
    version: Option<i64>,
  ) -> CacheResult<bool> {
    let key = self.make_key(key, version);
    let encoded = encode(&value.into())?;
    let ttl = self.backend_timeout(timeout);
    self
      .provider
      .with_client(Role::Write, |client| client.set(&key, &encoded, ttl, true))
  }

  pub fn incr(&self, key: &str, delta: i64, version: Option<i64>) -> CacheResult<i64> {
    let key = self.make_key(key, version);
    self
      .provider
      .with_client(Role::Write, |client| client.incr(&key, delta))
  }

  pub fn decr(&self, key: &str, delta: i64, version: Option<i64>) -> CacheResult<i64> {
    let key = self.make_key(key, version);
    self
      .provider
      .with_client(Role::Write, |client| client.decr(&key, delta))
  }

  pub fn delete(&self, key: &str, version: Option<i64>) -> CacheResult<()> {
    let key = self.make_key(key, version);
    self
      .provider
      .with_client(Role::Write, |client| client.delete(&key))
  }

  /// Reset a key's expiry. Returns whether the key existed.
  pub fn touch(&self, key: &str, timeout: Timeout, version: Option<i64>) -> CacheResult<bool> {
    let key = self.make_key(key, version);
    let ttl = self.backend_timeout(timeout);
    self
      .provider
      .with_client(Role::Write, |client| client.expire(&key, ttl))
  }

  /// Flush the whole backing keyspace, not only keys under this prefix
  pub fn clear(&self) -> CacheResult<()> {
    self
      .provider
      .with_client(Role::Write, |client| client.flush_db())
  }

  /// Release the connection; the next operation reconnects
  pub fn close(&self) -> CacheResult<()> {
    self.provider.close()
  }

  pub fn has_key(&self, key: &str, version: Option<i64>) -> CacheResult<bool> {
    Ok(self.get(key, version)?.is_some())
  }

  /// Fetch several keys; misses are left out of the result
  pub fn get_many<'k>(
    &self,
    keys: impl IntoIterator<Item = &'k str>,
    version: Option<i64>,
  ) -> CacheResult<HashMap<String, CacheValue>> {
    let mut found = HashMap::new();
    for key in keys {
      if let Some(value) = self.get(key, version)? {
        found.insert(key.to_string(), value);
      }
    }
    Ok(found)
  }

  pub fn set_many<K, V>(
    &self,
    entries: impl IntoIterator<Item = (K, V)>,
    timeout: Timeout,
    version: Option<i64>,
  ) -> CacheResult<()>
  where
    K: AsRef<str>,
    V: Into<CacheValue>,
  {
    for (key, value) in entries {
      self.set(key.as_ref(), value, timeout, version)?;
    }
    Ok(())
  }

  pub fn delete_many<'k>(
    &self,
    keys: impl IntoIterator<Item = &'k str>,
    version: Option<i64>,
  ) -> CacheResult<()> {
    for key in keys {
      self.delete(key, version)?;
    }
    Ok(())
  }

  /// Return the cached value, or compute, `add` and re-read it on a miss.
  /// The re-read returns whichever value won if another caller stored first.
  pub fn get_or_set<V: Into<CacheValue>>(
    &self,
    key: &str,
    default: impl FnOnce() -> V,
    timeout: Timeout,
    version: Option<i64>,
  ) -> CacheResult<CacheValue> {
    if let Some(value) = self.get(key, version)? {
      return Ok(value);
    }
    let value: CacheValue = default().into();
    self.add(key, value.clone(), timeout, version)?;
    Ok(self.get(key, version)?.unwrap_or(value))
  }
}
