//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: the dashboard starts with defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default HTTP port for capilar-dash
pub const DEFAULT_PORT: u16 = 5730;

/// Default key under which the edit overlay is persisted
pub const DEFAULT_STORAGE_KEY: &str = "scraper_product_edits";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CAPILAR_ROOT_FOLDER";

/// Default file names of the harvest documents inside the root folder
pub const DEFAULT_PRODUCTS_FILE: &str = "data.json";
pub const DEFAULT_TRACKING_FILE: &str = "tracking.json";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything absent falls back to CLI/env/defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Root folder holding harvest documents and the overlay store
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Harvest document locations
    #[serde(default)]
    pub data: DataConfig,

    /// Overlay persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Harvest document paths (relative paths resolve against the root folder)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub products_path: Option<PathBuf>,
    #[serde(default)]
    pub tracking_path: Option<PathBuf>,
}

/// Overlay persistence settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage key of the overlay document
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
        }
    }
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

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line (clap also folds in `CAPILAR_PORT`)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub products_path: Option<PathBuf>,
    pub tracking_path: Option<PathBuf>,
    pub storage_key: Option<String>,
}

/// Fully resolved dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub products_path: PathBuf,
    pub tracking_path: PathBuf,
    pub storage_key: String,
    pub log_level: String,
}

impl DashboardConfig {
    /// Merge CLI overrides, environment and TOML settings into one configuration
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref(), &toml);

        let products_path = cli
            .products_path
            .or(toml.data.products_path)
            .map(|p| anchor(&root_folder, p))
            .unwrap_or_else(|| root_folder.join(DEFAULT_PRODUCTS_FILE));
        let tracking_path = cli
            .tracking_path
            .or(toml.data.tracking_path)
            .map(|p| anchor(&root_folder, p))
            .unwrap_or_else(|| root_folder.join(DEFAULT_TRACKING_FILE));

        Self {
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            storage_key: cli.storage_key.unwrap_or(toml.storage.key),
            log_level: toml.logging.level,
            root_folder,
            products_path,
            tracking_path,
        }
    }

    /// Directory the file-backed overlay store writes into
    pub fn store_folder(&self) -> PathBuf {
        self.root_folder.join("edits")
    }
}

fn anchor(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// Root folder resolution: CLI argument, then `CAPILAR_ROOT_FOLDER`, then
/// the TOML `root_folder` key, then the OS default.
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Load the TOML configuration.
///
/// An explicit path must exist and parse. Without one, the platform config
/// locations are tried and a missing file yields the defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_file() {
            Some(path) => path,
            None => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Get default configuration file path for the platform, if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("capilar").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/capilar/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/capilar (or /var/lib/capilar for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("capilar"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/capilar"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/capilar
        dirs::data_dir()
            .map(|d| d.join("capilar"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/capilar"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\capilar
        dirs::data_local_dir()
            .map(|d| d.join("capilar"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\capilar"))
    } else {
        PathBuf::from("./capilar_data")
    }
}
