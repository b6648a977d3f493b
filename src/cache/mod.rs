//! Key-value cache adapter over Redis
//!
//! Provides:
//! - A get/set/add/delete/incr/decr/touch/clear façade with key namespacing
//! - A value codec that keeps integers native for atomic counters
//! - Direct single-node connections and sentinel-routed connections that
//!   resolve the master (writes) or a replica (reads) on every call

pub mod backend;
pub mod codec;
pub mod config;
pub mod keys;
pub mod provider;
pub mod transport;
pub mod timeout;
pub mod value;

pub use backend::{RedisCache, DEFAULT_TIMEOUT};
pub use codec::{decode, encode, try_decode, DeserializationFailure, EncodedValue};
pub use config::{BackendConfig, Endpoint, Location, Options, Target, DEFAULT_MASTER_GROUP};
pub use keys::KeyMaker;
pub use provider::{
  ConnectionProvider, Connector, DirectProvider, KvClient, Role, SentinelConnector,
  SentinelProvider, Topology,
};
pub use transport::{RedisConnector, RedisProvider, RedisSentinelConnector};
pub use timeout::{compute_ttl, Timeout};
pub use value::CacheValue;
