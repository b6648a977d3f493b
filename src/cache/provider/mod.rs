//! Connection providers
//!
//! A provider hands the façade a client for each operation. The direct
//! provider always hands out its one memoized connection; the sentinel
//! provider asks the topology for the current master or a replica on every
//! call.

mod direct;
mod sentinel;

pub use direct::DirectProvider;
pub use sentinel::SentinelProvider;

use super::codec::EncodedValue;
use super::config::{Endpoint, Options};
use crate::error::CacheResult;

/// Which node an operation must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Served by a replica when one is available
  Read,
  /// Must reach the master
  Write,
}

impl Role {
  pub fn for_write(for_write: bool) -> Self {
    if for_write {
      Role::Write
    } else {
      Role::Read
    }
  }
}

/// Commands the façade needs from the backing store
pub trait KvClient: Send {
  /// Address of the node this client talks to
  fn address(&self) -> String;

  fn get(&mut self, key: &str) -> CacheResult<Option<EncodedValue>>;

  /// Store a value. `ttl` of `None` means no expiry. Returns whether the
  /// value was stored.
  fn set(
    &mut self,
    key: &str,
    value: &EncodedValue,
    ttl: Option<u64>,
    only_if_absent: bool,
  ) -> CacheResult<bool>;

  fn delete(&mut self, key: &str) -> CacheResult<()>;

  fn incr(&mut self, key: &str, delta: i64) -> CacheResult<i64>;

  fn decr(&mut self, key: &str, delta: i64) -> CacheResult<i64>;

  /// Reset the key's expiry (`None` removes it). Returns whether the key
  /// exists.
  fn expire(&mut self, key: &str, ttl: Option<u64>) -> CacheResult<bool>;

  fn flush_db(&mut self) -> CacheResult<()>;

  fn is_open(&self) -> bool {
    true
  }

  fn close(&mut self) -> CacheResult<()> {
    Ok(())
  }
}

/// Opens single-node clients
pub trait Connector: Send + Sync {
  type Client: KvClient + 'static;

  fn connect(&self, endpoint: &Endpoint, options: &Options) -> CacheResult<Self::Client>;
}

/// Live view of a sentinel-monitored master/replica set
pub trait Topology: Send {
  type Client: KvClient + 'static;

  /// Client for the master the monitors currently report for `group`
  fn master_for(&mut self, group: &str) -> CacheResult<&mut Self::Client>;

  /// Client for a healthy replica of `group`
  fn replica_for(&mut self, group: &str) -> CacheResult<&mut Self::Client>;

  fn close(&mut self) -> CacheResult<()> {
    Ok(())
  }
}

/// Opens a topology client from sentinel monitor addresses
pub trait SentinelConnector: Send + Sync {
  type Topology: Topology + 'static;

  fn connect(&self, monitors: &[Endpoint], options: &Options) -> CacheResult<Self::Topology>;
}

/// Source of role-appropriate clients for cache operations
pub trait ConnectionProvider: Send + Sync {
  /// Run `op` against a client for `role`, creating the underlying
  /// connection on first use
  fn with_client<R>(
    &self,
    role: Role,
    op: impl FnOnce(&mut dyn KvClient) -> CacheResult<R>,
  ) -> CacheResult<R>;

  /// Release the underlying connection; the next operation reconnects
  fn close(&self) -> CacheResult<()>;
}
