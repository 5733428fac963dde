use crate::git::change::AssetLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub git: GitConfig,
    pub assets: AssetConfig,
    pub behavior: BehaviorConfig,
    pub diff: DiffConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GitConfig {
    /// Path to the git executable, resolved through PATH when bare
    pub executable: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Prefix marking paths that have sidecar files
    pub root: String,
    pub sidecar_suffix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BehaviorConfig {
    pub confirm_dangerous_ops: bool,
    pub log_commands: bool,
    /// Entries shown by a file's history
    pub log_count: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    /// Invoked as `<tool> <left> <right>`
    pub tool: String,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitpane"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the default location, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default_config());
        }
        Self::load_from(&path)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)?;
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            git: GitConfig {
                executable: "git".to_string(),
                timeout_seconds: 120,
            },
            assets: AssetConfig {
                root: "Assets".to_string(),
                sidecar_suffix: ".meta".to_string(),
            },
            behavior: BehaviorConfig {
                confirm_dangerous_ops: true,
                log_commands: true,
                log_count: 20,
            },
            diff: DiffConfig {
                tool: "diff".to_string(),
            },
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.git.executable.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git.executable must not be empty".to_string(),
            ));
        }

        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.assets.sidecar_suffix.is_empty() {
            return Err(ConfigError::InvalidValue(
                "assets.sidecar_suffix must not be empty".to_string(),
            ));
        }

        if self.behavior.log_count == 0 {
            return Err(ConfigError::InvalidValue(
                "log_count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout_seconds)
    }

    pub fn asset_layout(&self) -> AssetLayout {
        AssetLayout {
            asset_root: self.assets.root.clone(),
            sidecar_suffix: self.assets.sidecar_suffix.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
