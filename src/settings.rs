use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::backend::DEFAULT_TIMEOUT;
use crate::cache::config::{Location, Options};
use crate::cache::keys::KeyMaker;

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax. Substituted values are copied
/// through as-is and never expanded again.
fn expand_env_vars(input: &str) -> String {
  let mut expanded = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(pos) = rest.find('$') {
    expanded.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    if let Some(braced) = after.strip_prefix('{') {
      match braced.find('}') {
        Some(end) => {
          expanded.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
          rest = &braced[end + 1..];
        }
        None => {
          // Unterminated; keep the remainder literally
          expanded.push_str(&rest[pos..]);
          rest = "";
        }
      }
      continue;
    }

    let var_len = after
      .chars()
      .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
      .count();
    if var_len == 0 {
      expanded.push('$');
    } else {
      expanded.push_str(&std::env::var(&after[..var_len]).unwrap_or_default());
    }
    rest = &after[var_len..];
  }
  expanded.push_str(rest);
  expanded
}

/// Cache adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
  /// `host:port` for a single node, or a list of sentinel monitors
  #[serde(default)]
  pub location: Location,
  /// Default expiry in seconds; `null` never expires
  #[serde(default = "default_timeout")]
  pub timeout: Option<i64>,
  #[serde(default)]
  pub key_prefix: String,
  #[serde(default = "default_version")]
  pub version: i64,
  /// Transport options; keys are case-insensitive
  #[serde(default)]
  pub options: Options,
  #[serde(default)]
  pub logging: LoggingSection,
}

fn default_timeout() -> Option<i64> {
  Some(DEFAULT_TIMEOUT)
}

fn default_version() -> i64 {
  1
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      location: Location::default(),
      timeout: default_timeout(),
      key_prefix: String::new(),
      version: default_version(),
      options: Options::new(),
      logging: LoggingSection::default(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}
fn default_level() -> String {
  "info".into()
}
impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

impl CacheSettings {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
    let content = std::fs::read_to_string(&path)?;
    let expanded = expand_env_vars(&content);
    Ok(serde_yaml::from_str(&expanded)?)
  }

  pub fn find_and_load() -> Result<Option<Self>, anyhow::Error> {
    for p in ["scache.yaml", "scache.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  pub fn key_maker(&self) -> KeyMaker {
    KeyMaker::new(self.key_prefix.clone(), self.version)
  }
}
