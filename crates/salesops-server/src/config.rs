//! Server configuration.
//!
//! Read from an optional TOML file and overlaid with `SALESOPS_*` environment
//! variables; nested keys use a double underscore, e.g.
//! `SALESOPS_STORE__BACKEND=postgrest`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use salesops_core::attribution::LOOKBACK_DAYS;
use serde::Deserialize;

use crate::Error;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub auth_username:       String,
  /// PHC string produced by `server hash-password`.
  pub auth_password_hash:  String,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_minutes: i64,
  #[serde(default)]
  pub store:               StoreConfig,
  /// Attribution is disabled when absent.
  #[serde(default)]
  pub telephony:           Option<TelephonyConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  #[default]
  Sqlite,
  Postgrest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
  #[serde(default)]
  pub backend:           StoreBackend,
  #[serde(default = "default_sqlite_path")]
  pub sqlite_path:       PathBuf,
  #[serde(default)]
  pub postgrest_url:     Option<String>,
  #[serde(default)]
  pub postgrest_api_key: Option<String>,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend:           StoreBackend::default(),
      sqlite_path:       default_sqlite_path(),
      postgrest_url:     None,
      postgrest_api_key: None,
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelephonyConfig {
  pub base_url:      String,
  pub api_token:     String,
  #[serde(default = "default_lookback")]
  pub lookback_days: i64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_session_ttl() -> i64 { 12 * 60 }
fn default_sqlite_path() -> PathBuf { PathBuf::from("salesops.db") }
fn default_lookback() -> i64 { LOOKBACK_DAYS }

impl ServerConfig {
  /// Layer `path` (if it exists) under the process environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(env_source())
      .build()?
      .try_deserialize()
  }

  /// Parse a TOML document without consulting the environment.
  pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from_str(raw, FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  /// Reject combinations that deserialise but cannot run.
  pub fn validate(&self) -> Result<(), Error> {
    if self.session_ttl_minutes <= 0 {
      return Err(Error::Config("session_ttl_minutes must be positive".into()));
    }
    if self.store.backend == StoreBackend::Postgrest {
      let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
      if !present(&self.store.postgrest_url) || !present(&self.store.postgrest_api_key) {
        return Err(Error::Config(
          "store.postgrest_url and store.postgrest_api_key are required for the postgrest backend"
            .into(),
        ));
      }
    }
    if let Some(t) = &self.telephony
      && !(1..=LOOKBACK_DAYS).contains(&t.lookback_days)
    {
      return Err(Error::Config(format!(
        "telephony.lookback_days must be between 1 and {LOOKBACK_DAYS}"
      )));
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn env_source() -> Environment {
  Environment::with_prefix("SALESOPS")
    .prefix_separator("_")
    .separator("__")
}
