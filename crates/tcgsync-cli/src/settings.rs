//! Runtime configuration.
//!
//! Read from an optional TOML file, then overlaid by environment variables
//! prefixed `TCGSYNC_` (`TCGSYNC_DATABASE_PATH`, `TCGSYNC_API_TOKEN`, ...).
//! The loaded value is passed explicitly to each command.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, anyhow};
use serde::Deserialize;

use crate::partition::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.pokemontcg.io/v2/cards?select=id,name,tcgplayer";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  pub database_path:    PathBuf,
  /// Bearer token for the price feed; required by price commands only.
  #[serde(default)]
  pub api_token:        Option<String>,
  #[serde(default = "default_workers")]
  pub workers:          usize,
  #[serde(default = "default_retry_attempts")]
  pub retry_attempts:   u32,
  #[serde(default = "default_retry_delay_secs")]
  pub retry_delay_secs: u64,
  /// Price feed URL that partitions append `&q=set.id:<id>` to.
  #[serde(default = "default_base_url")]
  pub base_url:         String,
}

fn default_workers() -> usize { 3 }

fn default_retry_attempts() -> u32 { 3 }

fn default_retry_delay_secs() -> u64 { 10 }

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }

impl Settings {
  /// Load from `file` (if it exists) and the environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("TCGSYNC").try_parsing(true))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("invalid configuration (is database_path set?)")
  }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }

  /// The feed token, or a configuration error naming the missing key.
  pub fn api_token(&self) -> anyhow::Result<&str> {
    self
      .api_token
      .as_deref()
      .filter(|t| !t.is_empty())
      .ok_or_else(|| anyhow!("api_token is not configured (set TCGSYNC_API_TOKEN)"))
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      attempts: self.retry_attempts.max(1),
      delay:    Duration::from_secs(self.retry_delay_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
