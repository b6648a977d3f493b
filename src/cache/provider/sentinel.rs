//! Sentinel-routed provider

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{ConnectionProvider, KvClient, Role, SentinelConnector, Topology};
use crate::cache::config::{Endpoint, Options};
use crate::error::CacheResult;

/// Lazily opens a topology client from the monitor list, then resolves the
/// master (writes) or a replica (reads) before every operation so a
/// failover between calls is picked up by the next call.
pub struct SentinelProvider<S: SentinelConnector> {
  monitors: Vec<Endpoint>,
  options: Options,
  master_group: String,
  connector: S,
  topology: Mutex<Option<S::Topology>>,
}

impl<S: SentinelConnector> SentinelProvider<S> {
  pub fn new(
    monitors: Vec<Endpoint>,
    options: Options,
    master_group: impl Into<String>,
    connector: S,
  ) -> Self {
    Self {
      monitors,
      options,
      master_group: master_group.into(),
      connector,
      topology: Mutex::new(None),
    }
  }

  pub fn master_group(&self) -> &str {
    &self.master_group
  }

  pub fn monitors(&self) -> &[Endpoint] {
    &self.monitors
  }

  pub fn is_connected(&self) -> bool {
    self.topology.lock().is_some()
  }

  fn open(&self) -> CacheResult<S::Topology> {
    let topology = self.connector.connect(&self.monitors, &self.options)?;
    info!(
      monitors = self.monitors.len(),
      group = %self.master_group,
      "Sentinel topology client created"
    );
    Ok(topology)
  }
}

/// Resolve the client for `role` on every call
fn resolve_client<'t, T: Topology>(
  topology: &'t mut T,
  group: &str,
  role: Role,
) -> CacheResult<&'t mut T::Client> {
  let client = match role {
    Role::Write => topology.master_for(group)?,
    Role::Read => topology.replica_for(group)?,
  };
  debug!(?role, group, node = %client.address(), "Resolved sentinel node");
  Ok(client)
}

impl<S: SentinelConnector> ConnectionProvider for SentinelProvider<S> {
  fn with_client<R>(
    &self,
    role: Role,
    op: impl FnOnce(&mut dyn KvClient) -> CacheResult<R>,
  ) -> CacheResult<R> {
    let mut guard = self.topology.lock();
    let topology = match guard.take() {
      Some(topology) => guard.insert(topology),
      None => guard.insert(self.open()?),
    };
    let client = resolve_client(topology, &self.master_group, role)?;
    op(client)
  }

  fn close(&self) -> CacheResult<()> {
    let topology = self.topology.lock().take();
    if let Some(mut topology) = topology {
      topology.close()?;
      info!(group = %self.master_group, "Sentinel topology client closed");
    }
    Ok(())
  }
}
