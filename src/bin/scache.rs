use clap::Parser;
use sentinel_cache::cli::{apply_overrides, run, CliArgs};
use sentinel_cache::{CacheSettings, RedisCache};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), anyhow::Error> {
  let args = CliArgs::parse();

  // Load config: explicit path > auto-detect > defaults
  let mut settings = if let Some(path) = &args.config {
    CacheSettings::from_file(path)?
  } else {
    CacheSettings::find_and_load()?.unwrap_or_default()
  };

  // CLI args override config file
  apply_overrides(&mut settings, &args);

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.logging.level.clone().into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cache = RedisCache::new(&settings);
  run(&cache, &args.action)
}
