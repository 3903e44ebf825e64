//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.snowprobe.toml` files. Values given on the command line or through
//! the environment win over the file, and the file wins over defaults.

use crate::client::ClientConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".snowprobe.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Instance connection settings.
    #[serde(default)]
    pub instance: InstanceConfig,

    /// ROI analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Instance connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base URL, e.g. `https://example.service-now.com`.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum records read from each table by the ROI analysis.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_fetch_limit() -> u32 {
    1000
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_if_exists(Path::new(DEFAULT_CONFIG_FILE))
    }

    fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user actually supplied (flag or environment) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.instance {
            self.instance.url = url.clone();
        }
        if let Some(ref username) = args.username {
            self.instance.username = username.clone();
        }
        if let Some(ref password) = args.password {
            self.instance.password = password.clone();
        }
        if let Some(timeout) = args.timeout {
            self.instance.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the settings needed to talk to an instance.
    ///
    /// Credentials are not checked here; the instance rejects bad ones itself.
    pub fn validate(&self) -> Result<()> {
        let url = self.instance.url.trim();
        if url.is_empty() {
            bail!(
                "No instance URL configured. Pass --instance, set SERVICENOW_INSTANCE, or add [instance] url to {}",
                DEFAULT_CONFIG_FILE
            );
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!(
                "Instance URL must start with 'http://' or 'https://': {}",
                url
            );
        }
        if self.instance.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.analysis.fetch_limit == 0 {
            bail!("analysis.fetch_limit must be at least 1");
        }
        Ok(())
    }

    /// Connection settings for [`crate::client::TableClient`].
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            instance_url: self.instance.url.trim().to_string(),
            username: self.instance.username.clone(),
            password: self.instance.password.clone(),
            timeout_seconds: self.instance.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
