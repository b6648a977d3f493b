//! Single-node provider

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{ConnectionProvider, Connector, KvClient, Role};
use crate::cache::config::{Endpoint, Options};
use crate::error::CacheResult;

/// Lazily opens one connection to a fixed node and reuses it for reads and
/// writes alike
pub struct DirectProvider<C: Connector> {
  endpoint: Endpoint,
  options: Options,
  connector: C,
  client: Mutex<Option<C::Client>>,
}

impl<C: Connector> DirectProvider<C> {
  pub fn new(endpoint: Endpoint, options: Options, connector: C) -> Self {
    Self {
      endpoint,
      options,
      connector,
      client: Mutex::new(None),
    }
  }

  pub fn is_connected(&self) -> bool {
    self.client.lock().is_some()
  }

  fn open(&self) -> CacheResult<C::Client> {
    let client = self.connector.connect(&self.endpoint, &self.options)?;
    info!(endpoint = %self.endpoint, "Cache connection opened");
    Ok(client)
  }
}

impl<C: Connector> ConnectionProvider for DirectProvider<C> {
  fn with_client<R>(
    &self,
    role: Role,
    op: impl FnOnce(&mut dyn KvClient) -> CacheResult<R>,
  ) -> CacheResult<R> {
    // Held across the call so concurrent first uses open a single connection
    let mut guard = self.client.lock();
    let client = match guard.take() {
      Some(client) if client.is_open() => guard.insert(client),
      Some(_) => {
        warn!(endpoint = %self.endpoint, "Cache connection lost, reconnecting");
        guard.insert(self.open()?)
      }
      None => guard.insert(self.open()?),
    };
    debug!(?role, node = %client.address(), "Routing to direct node");
    op(client)
  }

  fn close(&self) -> CacheResult<()> {
    let client = self.client.lock().take();
    if let Some(mut client) = client {
      client.close()?;
      info!(endpoint = %self.endpoint, "Cache connection closed");
    }
    Ok(())
  }
}
