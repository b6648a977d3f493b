//! Redis Sentinel topology client

use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

use super::client::{connection_info, RedisClient, TransportOptions};
use crate::cache::config::{Endpoint, Options};
use crate::cache::provider::{KvClient, SentinelConnector, Topology};
use crate::error::{CacheError, CacheResult};

/// Sentinel-backed topology. Every `master_for`/`replica_for` call asks the
/// monitors again; connections are kept per resolved node address and
/// reused while they stay open.
pub struct RedisTopology {
  sentinel: Sentinel,
  node_info: SentinelNodeConnectionInfo,
  transport: TransportOptions,
  nodes: HashMap<String, RedisClient>,
}

impl RedisTopology {
  fn node(&mut self, client: redis::Client) -> CacheResult<&mut RedisClient> {
    let address = client.get_connection_info().addr.to_string();
    if self.nodes.get(&address).is_some_and(|node| !node.is_open()) {
      debug!(address = %address, "Dropping closed node connection");
      self.nodes.remove(&address);
    }
    match self.nodes.entry(address) {
      Entry::Occupied(entry) => Ok(entry.into_mut()),
      Entry::Vacant(entry) => {
        let node = RedisClient::open(&client, &self.transport)?;
        Ok(entry.insert(node))
      }
    }
  }
}

impl Topology for RedisTopology {
  type Client = RedisClient;

  fn master_for(&mut self, group: &str) -> CacheResult<&mut RedisClient> {
    let client = self
      .sentinel
      .master_for(group, Some(&self.node_info))
      .map_err(|e| CacheError::TopologyUnavailable {
        group: group.to_string(),
        role: "master",
        reason: e.to_string(),
      })?;
    self.node(client)
  }

  fn replica_for(&mut self, group: &str) -> CacheResult<&mut RedisClient> {
    let client = self
      .sentinel
      .replica_for(group, Some(&self.node_info))
      .map_err(|e| CacheError::TopologyUnavailable {
        group: group.to_string(),
        role: "replica",
        reason: e.to_string(),
      })?;
    self.node(client)
  }

  fn close(&mut self) -> CacheResult<()> {
    self.nodes.clear();
    Ok(())
  }
}

/// Builds [`RedisTopology`] clients from monitor addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisSentinelConnector;

impl SentinelConnector for RedisSentinelConnector {
  type Topology = RedisTopology;

  fn connect(&self, monitors: &[Endpoint], options: &Options) -> CacheResult<RedisTopology> {
    if monitors.is_empty() {
      return Err(CacheError::InvalidEndpoint(
        "no sentinel monitors configured".to_string(),
      ));
    }
    let transport = TransportOptions::from_options(options)?;
    let monitor_info = monitors
      .iter()
      .map(|endpoint| connection_info(endpoint, transport.sentinel_info()))
      .collect::<CacheResult<Vec<_>>>()?;
    let sentinel = Sentinel::build(monitor_info)?;

    Ok(RedisTopology {
      sentinel,
      node_info: SentinelNodeConnectionInfo {
        tls_mode: None,
        redis_connection_info: Some(transport.node_info()),
      },
      transport,
      nodes: HashMap::new(),
    })
  }
}
