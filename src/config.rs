//! Configuration loading
//!
//! Settings come from an optional YAML file. Every field has a default, so a
//! missing file or a partial one is fine. The provider API key is never read
//! from the file; it comes from the environment.

use crate::model::PlanTier;
use crate::provider::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolmesConfig {
    pub provider: GeminiConfig,
    /// SQLite file; `None` resolves to [`default_db_path`]
    pub db_path: Option<PathBuf>,
    /// Plan used when no session has been stored yet
    pub default_plan: PlanTier,
}

impl Default for HolmesConfig {
    fn default() -> Self {
        Self {
            provider: GeminiConfig::default(),
            db_path: None,
            default_plan: PlanTier::Free,
        }
    }
}

impl HolmesConfig {
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Load from `path` if given, else from [`default_config_path`] if that
    /// file exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// `~/.config/holmes/config.yaml` (platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("holmes").join("config.yaml"))
}

/// `~/.local/share/holmes/holmes.db` (platform equivalent)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("holmes").join("holmes.db")
}
