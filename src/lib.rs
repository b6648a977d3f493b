pub mod cache;
pub mod error;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;

pub use cache::{CacheValue, RedisCache, Timeout};
pub use error::{CacheError, CacheResult};
pub use settings::CacheSettings;
