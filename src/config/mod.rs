//! Configuration loading, merging and validation.
//!
//! Layered lowest to highest: built-in defaults, system config at
//! `~/.conclave/config.toml`, local `./conclave.toml`, API key from
//! `~/.conclave/keys.toml`, then `CONCLAVE_*` environment variables.

mod types;

pub use types::{
    EngineConfig, LimitSettings, LoggingSettings, ModelRoster, OutputSettings, ProviderSettings,
    ReviewerSelection,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Home directory for user-level configuration: `~/.conclave`.
pub fn conclave_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".conclave")
}

fn system_config_path() -> PathBuf {
    conclave_home().join("config.toml")
}

fn local_config_path() -> PathBuf {
    PathBuf::from("./conclave.toml")
}

fn keys_path() -> PathBuf {
    conclave_home().join("keys.toml")
}

/// Keys file structure: sensitive values kept out of config.toml.
#[derive(Debug, Default, Deserialize)]
struct KeysFile {
    #[serde(default)]
    provider: KeysProviderSection,
}

#[derive(Debug, Default, Deserialize)]
struct KeysProviderSection {
    api_key: Option<String>,
}

impl EngineConfig {
    /// Load configuration from the default locations.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let system = system_config_path();
        if system.exists() {
            tracing::debug!(path = %system.display(), "loading system config");
            config = merge_from_file(&system)?;
        }

        let local = local_config_path();
        if local.exists() {
            tracing::debug!(path = %local.display(), "loading local config");
            config = merge_from_file(&local)?;
        }

        // keys.toml overrides any api_key from config files
        if let Ok(keys) = load_keys()
            && let Some(key) = keys.provider.api_key
            && !key.is_empty()
        {
            config.provider.api_key = Some(key);
        }

        config = apply_env_overrides(config);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let mut config = merge_from_file(path)?;
        config = apply_env_overrides(config);
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would fail mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            anyhow::bail!("provider.base_url must not be empty");
        }
        if self.models.reviewers.is_empty() {
            anyhow::bail!("models.reviewers must list at least one model");
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => anyhow::bail!("unknown logging.level: {other}"),
        }
    }
}

fn merge_from_file(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn load_keys() -> Result<KeysFile> {
    let contents = fs::read_to_string(keys_path())?;
    Ok(toml::from_str(&contents)?)
}

fn apply_env_overrides(mut config: EngineConfig) -> EngineConfig {
    if let Ok(key) = std::env::var("CONCLAVE_API_KEY")
        && !key.is_empty()
    {
        config.provider.api_key = Some(key);
    }
    if let Ok(url) = std::env::var("CONCLAVE_BASE_URL")
        && !url.is_empty()
    {
        config.provider.base_url = url;
    }
    if let Ok(level) = std::env::var("CONCLAVE_LOG_LEVEL")
        && !level.is_empty()
    {
        config.logging.level = level;
    }
    config
}
