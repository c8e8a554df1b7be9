/// Configuration for githarvest
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, HarvestError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory where local working copies are kept
    #[serde(default = "default_repos_dir")]
    pub repos_dir: PathBuf,
}

fn default_repos_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_repos_dir()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos_dir: default_repos_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self, HarvestError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, HarvestError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("GITHARVEST_REPOS_DIR") {
            if !dir.is_empty() {
                self.repos_dir = PathBuf::from(dir);
            }
        }
    }

    /// Default working-copy directory for a source URI
    ///
    /// The URI is flattened into a single path component so distinct sources
    /// never collide inside `repos_dir`.
    pub fn repo_dir_for(&self, uri: &str) -> PathBuf {
        let slug: String = uri
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.repos_dir.join(slug)
    }
}
