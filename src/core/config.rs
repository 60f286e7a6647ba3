use crate::core::currency::CurrencyCode;
use crate::core::engine::EngineOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Whole-request timeout applied by the HTTP client.
    pub timeout_secs: u64,
    /// Extra attempts for transient failures.
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: "https://my.transfergo.com".to_string(),
            timeout_secs: 10,
            retries: 1,
            retry_delay_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub probe_interval_secs: u64,
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_interval_secs: 5,
            probe_timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause after typing before a quote is requested, `0` disables.
    pub debounce_ms: u64,
    pub default_from: String,
    pub default_to: String,
    pub default_amount: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            debounce_ms: 400,
            default_from: "PLN".to_string(),
            default_to: "UAH".to_string(),
            default_amount: "300.00".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn to_options(&self) -> Result<EngineOptions> {
        let from: CurrencyCode = self
            .default_from
            .parse()
            .context("Invalid engine.default_from")?;
        let to: CurrencyCode = self
            .default_to
            .parse()
            .context("Invalid engine.default_to")?;
        Ok(EngineOptions {
            from,
            to,
            amount_from: self.default_amount.clone(),
            debounce: (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms)),
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub connectivity: ConnectivityConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "xfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
