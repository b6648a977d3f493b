//! Cache error types

use thiserror::Error;

/// Errors surfaced by cache operations
#[derive(Debug, Error)]
pub enum CacheError {
  /// Sentinel monitors could not name a usable master or replica
  #[error("no {role} available for master group '{group}': {reason}")]
  TopologyUnavailable {
    group: String,
    role: &'static str,
    reason: String,
  },

  /// A value could not be serialized for storage
  #[error("cache serialization error: {0}")]
  Serialization(#[from] rmp_serde::encode::Error),

  /// Network or protocol failure from the backing store, passed through as-is
  #[error(transparent)]
  Transport(#[from] redis::RedisError),

  /// An endpoint that cannot be turned into a socket address
  #[error("invalid endpoint '{0}'")]
  InvalidEndpoint(String),

  /// A transport option with a value of the wrong shape
  #[error("invalid value for option '{name}': {reason}")]
  InvalidOption { name: String, reason: String },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
