//! Redis transport: single-node clients, the sentinel topology and the
//! provider picked from configuration

mod client;
mod sentinel;

pub use client::{stored_value, RedisClient, RedisConnector, TransportOptions};
pub use sentinel::{RedisSentinelConnector, RedisTopology};

use super::config::{BackendConfig, Target};
use super::provider::{ConnectionProvider, DirectProvider, KvClient, Role, SentinelProvider};
use crate::error::CacheResult;

/// Provider chosen from the configured target
pub enum RedisProvider {
  Direct(DirectProvider<RedisConnector>),
  Sentinel(SentinelProvider<RedisSentinelConnector>),
}

impl RedisProvider {
  pub fn new(config: BackendConfig) -> Self {
    match config.target {
      Target::Direct(endpoint) => {
        RedisProvider::Direct(DirectProvider::new(endpoint, config.options, RedisConnector))
      }
      Target::Sentinel(monitors) => RedisProvider::Sentinel(SentinelProvider::new(
        monitors,
        config.options,
        config.master_group,
        RedisSentinelConnector,
      )),
    }
  }

  pub fn is_sentinel(&self) -> bool {
    matches!(self, RedisProvider::Sentinel(_))
  }
}

impl ConnectionProvider for RedisProvider {
  fn with_client<R>(
    &self,
    role: Role,
    op: impl FnOnce(&mut dyn KvClient) -> CacheResult<R>,
  ) -> CacheResult<R> {
    match self {
      RedisProvider::Direct(p) => p.with_client(role, op),
      RedisProvider::Sentinel(p) => p.with_client(role, op),
    }
  }

  fn close(&self) -> CacheResult<()> {
    match self {
      RedisProvider::Direct(p) => p.close(),
      RedisProvider::Sentinel(p) => p.close(),
    }
  }
}
