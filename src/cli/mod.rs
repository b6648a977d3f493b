//! `scache` command-line client

mod commands;

pub use commands::{apply_overrides, run, CacheAction, CliArgs};
