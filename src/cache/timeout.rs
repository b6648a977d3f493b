//! Expiry handling

/// Expiry requested by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeout {
  /// Use the adapter's configured default
  #[default]
  Default,
  /// Never expire
  Forever,
  /// Expire after this many seconds; zero or negative means never
  Seconds(i64),
}

impl From<i64> for Timeout {
  fn from(secs: i64) -> Self {
    Timeout::Seconds(secs)
  }
}

impl From<Option<i64>> for Timeout {
  fn from(secs: Option<i64>) -> Self {
    secs.map(Timeout::Seconds).unwrap_or(Timeout::Forever)
  }
}

/// Normalize a requested timeout into the TTL sent to the store.
///
/// `None` means no expiry. A non-positive timeout never means "expire now".
pub fn compute_ttl(timeout: Timeout, default_timeout: Option<i64>) -> Option<u64> {
  let secs = match timeout {
    Timeout::Default => default_timeout?,
    Timeout::Forever => return None,
    Timeout::Seconds(secs) => secs,
  };
  (secs > 0).then_some(secs as u64)
}
