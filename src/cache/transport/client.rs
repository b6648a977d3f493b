//! Redis client for a single node

use redis::{ConnectionAddr, ConnectionInfo, ConnectionLike, ErrorKind, RedisConnectionInfo};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::codec::EncodedValue;
use crate::cache::config::{Endpoint, Options};
use crate::cache::provider::{Connector, KvClient};
use crate::error::{CacheError, CacheResult};

/// Options understood by the Redis transport; others are ignored
const KNOWN_OPTIONS: &[&str] = &[
  "db",
  "username",
  "password",
  "socket_timeout",
  "socket_connect_timeout",
  "sentinel_username",
  "sentinel_password",
];

/// Transport settings extracted from the forwarded option map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
  pub db: i64,
  pub username: Option<String>,
  pub password: Option<String>,
  pub socket_timeout: Option<Duration>,
  pub connect_timeout: Option<Duration>,
  pub sentinel_username: Option<String>,
  pub sentinel_password: Option<String>,
}

impl TransportOptions {
  pub fn from_options(options: &Options) -> CacheResult<Self> {
    for name in options.keys() {
      if !KNOWN_OPTIONS.contains(&name.as_str()) {
        warn!(option = %name, "Ignoring option not understood by the Redis transport");
      }
    }

    Ok(Self {
      db: option_i64(options, "db")?.unwrap_or(0),
      username: option_string(options, "username")?,
      password: option_string(options, "password")?,
      socket_timeout: option_seconds(options, "socket_timeout")?,
      connect_timeout: option_seconds(options, "socket_connect_timeout")?,
      sentinel_username: option_string(options, "sentinel_username")?,
      sentinel_password: option_string(options, "sentinel_password")?,
    })
  }

  /// Per-node settings (database and credentials)
  pub fn node_info(&self) -> RedisConnectionInfo {
    RedisConnectionInfo {
      db: self.db,
      username: self.username.clone(),
      password: self.password.clone(),
      ..Default::default()
    }
  }

  /// Settings for talking to the sentinel monitors themselves
  pub fn sentinel_info(&self) -> RedisConnectionInfo {
    RedisConnectionInfo {
      username: self.sentinel_username.clone(),
      password: self.sentinel_password.clone(),
      ..Default::default()
    }
  }
}

fn invalid(name: &str, reason: &str) -> CacheError {
  CacheError::InvalidOption {
    name: name.to_string(),
    reason: reason.to_string(),
  }
}

fn option_i64(options: &Options, name: &str) -> CacheResult<Option<i64>> {
  match options.get(name) {
    None | Some(serde_json::Value::Null) => Ok(None),
    Some(serde_json::Value::Number(n)) => n
      .as_i64()
      .map(Some)
      .ok_or_else(|| invalid(name, "expected an integer")),
    Some(serde_json::Value::String(s)) => s
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| invalid(name, "expected an integer")),
    Some(_) => Err(invalid(name, "expected an integer")),
  }
}

fn option_string(options: &Options, name: &str) -> CacheResult<Option<String>> {
  match options.get(name) {
    None | Some(serde_json::Value::Null) => Ok(None),
    Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
    Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
    Some(_) => Err(invalid(name, "expected a string")),
  }
}

fn option_seconds(options: &Options, name: &str) -> CacheResult<Option<Duration>> {
  let secs = match options.get(name) {
    None | Some(serde_json::Value::Null) => return Ok(None),
    Some(serde_json::Value::Number(n)) => n.as_f64(),
    Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
    Some(_) => None,
  };
  match secs {
    Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
    _ => Err(invalid(name, "expected a positive number of seconds")),
  }
}

/// Connection info for a configured endpoint
pub fn connection_info(endpoint: &Endpoint, redis: RedisConnectionInfo) -> CacheResult<ConnectionInfo> {
  let port = endpoint.port_number()?;
  Ok(ConnectionInfo {
    addr: ConnectionAddr::Tcp(endpoint.host.clone(), port),
    redis,
  })
}

/// Blocking connection to one Redis node
pub struct RedisClient {
  address: String,
  connection: redis::Connection,
}

impl std::fmt::Debug for RedisClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RedisClient")
      .field("address", &self.address)
      .finish()
  }
}

impl RedisClient {
  /// Open a connection through an already-configured client
  pub fn open(client: &redis::Client, options: &TransportOptions) -> CacheResult<Self> {
    let address = client.get_connection_info().addr.to_string();
    let connection = match options.connect_timeout {
      Some(timeout) => client.get_connection_with_timeout(timeout)?,
      None => client.get_connection()?,
    };
    connection.set_read_timeout(options.socket_timeout)?;
    connection.set_write_timeout(options.socket_timeout)?;
    debug!(address = %address, "Redis connection established");
    Ok(Self {
      address,
      connection,
    })
  }
}

/// Map a GET reply onto a stored value
pub fn stored_value(reply: redis::Value) -> CacheResult<Option<EncodedValue>> {
  match reply {
    redis::Value::Nil => Ok(None),
    redis::Value::Int(i) => Ok(Some(EncodedValue::Int(i))),
    redis::Value::BulkString(bytes) => Ok(Some(EncodedValue::from_stored(bytes))),
    redis::Value::SimpleString(s) => Ok(Some(EncodedValue::from_stored(s.into_bytes()))),
    _ => Err(CacheError::Transport(
      (ErrorKind::TypeError, "unexpected reply to GET").into(),
    )),
  }
}

impl KvClient for RedisClient {
  fn address(&self) -> String {
    self.address.clone()
  }

  fn get(&mut self, key: &str) -> CacheResult<Option<EncodedValue>> {
    let reply: redis::Value = redis::cmd("GET").arg(key).query(&mut self.connection)?;
    let value = stored_value(reply)?;
    if value.is_some() {
      debug!(key = key, "Cache HIT");
    } else {
      debug!(key = key, "Cache MISS");
    }
    Ok(value)
  }

  fn set(
    &mut self,
    key: &str,
    value: &EncodedValue,
    ttl: Option<u64>,
    only_if_absent: bool,
  ) -> CacheResult<bool> {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value.to_wire());
    if let Some(ttl) = ttl {
      cmd.arg("EX").arg(ttl);
    }
    if only_if_absent {
      cmd.arg("NX");
    }

    // NX rejection comes back as nil
    let reply: redis::Value = cmd.query(&mut self.connection)?;
    let stored = !matches!(reply, redis::Value::Nil);
    debug!(key = key, ttl = ?ttl, nx = only_if_absent, stored, "Cache SET");
    Ok(stored)
  }

  fn delete(&mut self, key: &str) -> CacheResult<()> {
    redis::cmd("DEL")
      .arg(key)
      .query::<()>(&mut self.connection)?;
    debug!(key = key, "Cache DEL");
    Ok(())
  }

  fn incr(&mut self, key: &str, delta: i64) -> CacheResult<i64> {
    Ok(
      redis::cmd("INCRBY")
        .arg(key)
        .arg(delta)
        .query(&mut self.connection)?,
    )
  }

  fn decr(&mut self, key: &str, delta: i64) -> CacheResult<i64> {
    Ok(
      redis::cmd("DECRBY")
        .arg(key)
        .arg(delta)
        .query(&mut self.connection)?,
    )
  }

  fn expire(&mut self, key: &str, ttl: Option<u64>) -> CacheResult<bool> {
    match ttl {
      Some(ttl) => Ok(
        redis::cmd("EXPIRE")
          .arg(key)
          .arg(ttl)
          .query(&mut self.connection)?,
      ),
      None => {
        // PERSIST reports 0 for keys without a TTL, so ask EXISTS as well
        let persisted: bool = redis::cmd("PERSIST").arg(key).query(&mut self.connection)?;
        if persisted {
          return Ok(true);
        }
        Ok(redis::cmd("EXISTS").arg(key).query(&mut self.connection)?)
      }
    }
  }

  fn flush_db(&mut self) -> CacheResult<()> {
    redis::cmd("FLUSHDB").query::<()>(&mut self.connection)?;
    debug!(address = %self.address, "Cache FLUSHDB");
    Ok(())
  }

  fn is_open(&self) -> bool {
    self.connection.is_open()
  }
}

/// Opens [`RedisClient`]s for configured endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl Connector for RedisConnector {
  type Client = RedisClient;

  fn connect(&self, endpoint: &Endpoint, options: &Options) -> CacheResult<RedisClient> {
    let transport = TransportOptions::from_options(options)?;
    let info = connection_info(endpoint, transport.node_info())?;
    let client = redis::Client::open(info)?;
    RedisClient::open(&client, &transport)
  }
}
