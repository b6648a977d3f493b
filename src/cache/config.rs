//! Backend configuration
//!
//! Normalizes the caller's connection target and option bag. Parsing is
//! permissive: malformed entries are skipped here and bad hosts or ports
//! only surface when a connection is attempted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CacheError, CacheResult};

/// Transport options, keyed by lower-cased option name
pub type Options = BTreeMap<String, serde_json::Value>;

/// Option naming the sentinel master group
pub const MASTER_GROUP_OPTION: &str = "master_host";

/// Master group used when none is configured
pub const DEFAULT_MASTER_GROUP: &str = "mymaster";

/// One node of the backing store, as configured
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
  pub host: String,
  pub port: String,
}

impl Endpoint {
  /// Split `host:port` at the first colon. No validation happens here.
  pub fn parse(s: &str) -> Self {
    match s.split_once(':') {
      Some((host, port)) => Self {
        host: host.to_string(),
        port: port.to_string(),
      },
      None => Self {
        host: s.to_string(),
        port: String::new(),
      },
    }
  }

  /// Numeric port, checked when connecting
  pub fn port_number(&self) -> CacheResult<u16> {
    self
      .port
      .trim()
      .parse()
      .map_err(|_| CacheError::InvalidEndpoint(self.to_string()))
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.host, self.port)
  }
}

/// Connection target as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
  /// A single `host:port`
  Single(String),
  /// Sentinel monitor addresses; non-string entries are ignored
  Multiple(Vec<serde_json::Value>),
}

impl Default for Location {
  fn default() -> Self {
    Location::Single(default_location())
  }
}

impl From<&str> for Location {
  fn from(s: &str) -> Self {
    Location::Single(s.to_string())
  }
}

impl From<Vec<&str>> for Location {
  fn from(items: Vec<&str>) -> Self {
    Location::Multiple(items.into_iter().map(serde_json::Value::from).collect())
  }
}

fn default_location() -> String {
  "localhost:6379".to_string()
}

/// Where the adapter connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// One node serving reads and writes
  Direct(Endpoint),
  /// Sentinel monitors tracking a master/replica set
  Sentinel(Vec<Endpoint>),
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Direct(endpoint) => write!(f, "direct {}", endpoint),
      Target::Sentinel(monitors) => {
        let monitors: Vec<String> = monitors.iter().map(Endpoint::to_string).collect();
        write!(f, "sentinel [{}]", monitors.join(", "))
      }
    }
  }
}

/// Canonical connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
  pub target: Target,
  /// Options forwarded to the transport; never contains `master_host`
  pub options: Options,
  pub master_group: String,
}

impl BackendConfig {
  pub fn parse(location: &Location, options: &Options) -> Self {
    let target = match location {
      Location::Single(s) => Target::Direct(Endpoint::parse(s)),
      Location::Multiple(items) => Target::Sentinel(
        items
          .iter()
          .filter_map(serde_json::Value::as_str)
          .map(Endpoint::parse)
          .collect(),
      ),
    };

    let mut options: Options = options
      .iter()
      .map(|(k, v)| (k.to_lowercase(), v.clone()))
      .collect();

    let master_group = match options.remove(MASTER_GROUP_OPTION) {
      Some(serde_json::Value::String(s)) => s,
      Some(serde_json::Value::Null) | None => DEFAULT_MASTER_GROUP.to_string(),
      Some(other) => other.to_string(),
    };

    Self {
      target,
      options,
      master_group,
    }
  }

  pub fn is_sentinel(&self) -> bool {
    matches!(self.target, Target::Sentinel(_))
  }
}
