use clap::{Parser, Subcommand};

use crate::cache::config::Location;
use crate::cache::{CacheValue, RedisCache, Timeout};
use crate::settings::CacheSettings;

#[derive(Parser, Debug)]
#[command(name = "scache", about = "Cache client for Redis and Redis Sentinel", version)]
pub struct CliArgs {
  /// Settings file (defaults to ./scache.yaml when present)
  #[arg(short, long, env = "SCACHE_CONFIG")]
  pub config: Option<String>,
  /// host:port to connect to; repeat for sentinel monitors
  #[arg(short = 'L', long = "location", env = "SCACHE_LOCATION", value_delimiter = ',')]
  pub locations: Vec<String>,
  /// Transport option as KEY=VALUE (e.g. master_host=mymaster, db=1)
  #[arg(short = 'o', long = "option", value_parser = parse_option)]
  pub options: Vec<(String, String)>,
  /// Key prefix
  #[arg(long)]
  pub prefix: Option<String>,
  #[arg(long)]
  pub log_level: Option<String>,
  #[command(subcommand)]
  pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
  /// Get a value by key
  Get {
    key: String,
    /// Printed when the key is missing
    #[arg(short, long)]
    default: Option<String>,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Set a value
  Set {
    key: String,
    /// Integer, JSON, or plain text
    value: String,
    /// Expiry in seconds (<= 0 = no expiry; omitted = configured default)
    #[arg(short, long, allow_negative_numbers = true)]
    timeout: Option<i64>,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Set a value only if the key does not exist
  Add {
    key: String,
    value: String,
    #[arg(short, long, allow_negative_numbers = true)]
    timeout: Option<i64>,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Delete a key
  Delete {
    key: String,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Atomically increment an integer value
  Incr {
    key: String,
    #[arg(default_value = "1", allow_negative_numbers = true)]
    delta: i64,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Atomically decrement an integer value
  Decr {
    key: String,
    #[arg(default_value = "1", allow_negative_numbers = true)]
    delta: i64,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Reset a key's expiry
  Touch {
    key: String,
    #[arg(short, long, allow_negative_numbers = true)]
    timeout: Option<i64>,
    #[arg(long)]
    version: Option<i64>,
  },
  /// Flush the entire backing database
  Clear,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn timeout_arg(timeout: Option<i64>) -> Timeout {
  timeout.map(Timeout::Seconds).unwrap_or_default()
}

/// Merge command-line overrides into the loaded settings
pub fn apply_overrides(settings: &mut CacheSettings, args: &CliArgs) {
  match args.locations.as_slice() {
    [] => {}
    [single] => settings.location = Location::Single(single.clone()),
    many => {
      settings.location = Location::Multiple(many.iter().cloned().map(serde_json::Value::from).collect())
    }
  }
  for (key, value) in &args.options {
    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::from(value.as_str()));
    settings.options.insert(key.clone(), value);
  }
  if let Some(prefix) = &args.prefix {
    settings.key_prefix = prefix.clone();
  }
  if let Some(level) = &args.log_level {
    settings.logging.level = level.clone();
  }
}

fn render_value(value: &CacheValue) -> Result<String, anyhow::Error> {
  if value.is_null() {
    return Ok("null".to_string());
  }
  Ok(match value.as_str() {
    Some(text) => text.to_string(),
    None => serde_json::to_string_pretty(&value.to_json())?,
  })
}

fn print_value(value: &CacheValue) -> Result<(), anyhow::Error> {
  println!("{}", render_value(value)?);
  Ok(())
}

/// Run one cache action and print its result
pub fn run(cache: &RedisCache, action: &CacheAction) -> Result<(), anyhow::Error> {
  match action {
    CacheAction::Get {
      key,
      default,
      version,
    } => match (cache.get(key, *version)?, default) {
      (Some(value), _) => print_value(&value)?,
      (None, Some(default)) => print_value(&CacheValue::parse_arg(default))?,
      (None, None) => println!("(nil)"),
    },
    CacheAction::Set {
      key,
      value,
      timeout,
      version,
    } => {
      cache.set(key, CacheValue::parse_arg(value), timeout_arg(*timeout), *version)?;
      println!("OK");
    }
    CacheAction::Add {
      key,
      value,
      timeout,
      version,
    } => {
      let stored = cache.add(key, CacheValue::parse_arg(value), timeout_arg(*timeout), *version)?;
      println!("{}", if stored { "STORED" } else { "NOT_STORED" });
    }
    CacheAction::Delete { key, version } => {
      cache.delete(key, *version)?;
      println!("OK");
    }
    CacheAction::Incr {
      key,
      delta,
      version,
    } => println!("{}", cache.incr(key, *delta, *version)?),
    CacheAction::Decr {
      key,
      delta,
      version,
    } => println!("{}", cache.decr(key, *delta, *version)?),
    CacheAction::Touch {
      key,
      timeout,
      version,
    } => {
      let touched = cache.touch(key, timeout_arg(*timeout), *version)?;
      println!("{}", if touched { "TOUCHED" } else { "NOT_FOUND" });
    }
    CacheAction::Clear => {
      cache.clear()?;
      println!("OK");
    }
  }
  cache.close()?;
  Ok(())
}
