//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Listing server used when nothing overrides it.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3333";
/// Seconds between listing refreshes unless configured otherwise.
pub const DEFAULT_REFRESH_SECS: u64 = 30;

const DEFAULT_CONFIG: &str = r#"# duotui configuration.
#
# Keys can also be overridden through the environment, e.g.
# DUOTUI_SERVER_URL=http://duo.example.org

# Base URL of the listing server.
server_url = "http://localhost:3333"

# Seconds between listing refreshes.
refresh_secs = 30
"#;

/// Runtime configuration for the duotui client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the listing server.
    pub server_url: String,
    /// Seconds between listing refreshes.
    pub refresh_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the user config file plus `DUOTUI_*`
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_file_path()?)
    }

    /// Load configuration layered over the given file, which may be
    /// absent.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("server_url", DEFAULT_SERVER_URL)?
            .set_default("refresh_secs", DEFAULT_REFRESH_SECS)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("DUOTUI"))
            .build()
            .context("failed to load configuration")?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Refresh period as a [`Duration`]. A configured zero is treated
    /// as one second so the refresh loop never spins.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

/// Path of the user configuration file.
pub fn config_file_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("could not determine config directory")?;
    Ok(dir.join("duotui").join("config.toml"))
}

/// Write the default configuration file when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_file_path()?;
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
