//! Configuration loading and database path resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "HOSTREL_DATABASE";

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "HOSTREL_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; a missing file is not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub labeling: LabelingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Feature pass settings
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    /// Hosts between two progress log lines
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
        }
    }
}

/// Labeling session settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelingConfig {
    /// Fixed shuffle seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_progress_interval() -> u64 {
    1000
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        if config.features.progress_interval == 0 {
            return Err(Error::Config(
                "features.progress_interval must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Config file to read, if any
    ///
    /// Priority: explicit path → `HOSTREL_CONFIG` → user config dir. The
    /// first two are returned even when missing so that loading reports the
    /// error; the user config dir is only used when the file exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        default_config_path().filter(|path| path.exists())
    }

    /// Load the located file, or built-in defaults when there is none
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Database path resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", DATABASE_ENV_VAR);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_database_path()
}

/// `~/.config/hostrel/config.toml` or the platform equivalent
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hostrel").join("config.toml"))
}

/// Get OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hostrel"))
        .unwrap_or_else(|| PathBuf::from("./hostrel_data"))
        .join("hostrel.db")
}
