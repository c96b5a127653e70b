use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use config::{Environment, File};
use icsview_core::Tz;
use icsview_core::window::DEFAULT_HORIZON_DAYS;
use serde::Deserialize;

/// Prefix for environment overrides (e.g. ICSVIEW_DEFAULT_SOURCE)
const ENV_PREFIX: &str = "ICSVIEW";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IANA timezone every occurrence is shown in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// How many days ahead recurring events are expanded
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,

    /// Calendar read when no source is given on the command line
    pub default_source: Option<String>,

    /// Timeout for downloading a calendar, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    pub fn target_timezone(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }
}

fn default_timezone() -> String {
    "America/Denver".to_string()
}

fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Look up an IANA timezone by name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("Unknown timezone '{}': {}", name, e))
}

/// Get the config file path (~/.config/icsview/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("icsview");
    Ok(config_dir.join("config.toml"))
}

/// Load config from ~/.config/icsview/config.toml, overridden by ICSVIEW_* variables.
///
/// A missing file is not an error: every setting has a default.
pub fn load_config() -> Result<Config> {
    let path = config_path().ok();
    load_from(path.as_deref())
}

pub fn load_from(path: Option<&Path>) -> Result<Config> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path.to_path_buf()).required(false));
    }

    let source_desc = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "environment".to_string());

    let config: Config = builder
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .with_context(|| format!("Failed to read config from {}", source_desc))?
        .try_deserialize()
        .with_context(|| format!("Failed to parse config from {}", source_desc))?;

    if config.horizon_days <= 0 {
        anyhow::bail!(
            "horizon_days must be positive, got {} (in {})",
            config.horizon_days,
            source_desc
        );
    }

    Ok(config)
}
