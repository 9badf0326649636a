//! TOML-based configuration for the keytally daemon and stats CLI.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Keytally\config.toml`
//! - Linux:    `~/.config/keytally/config.toml`
//! - macOS:    `~/Library/Application Support/Keytally/config.toml`
//!
//! The statistics file lives next to it (`stats.json`) unless
//! `storage.stats_path` overrides it.
//!
//! ```toml
//! [daemon]
//! log_level = "info"
//! flush_interval_secs = 60
//!
//! [storage]
//! stats_path = "/var/lib/keytally/stats.json"
//!
//! [stats]
//! top_n = 10
//! min_word_len = 3
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so an empty or
//! missing file yields a complete default configuration.

use std::path::{Path, PathBuf};

use keytally_core::store::report::{DEFAULT_MIN_WORD_LEN, DEFAULT_TOP_N};
use keytally_core::ReportOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the durable statistics inside the data directory.
pub const STATS_FILE_NAME: &str = "stats.json";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform data directory could not be determined.  There is no
    /// sensible place to keep statistics, so this is fatal.
    #[error("could not determine platform data directory")]
    NoPlatformDataDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Recording daemon behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between periodic flushes.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

/// Where the durable statistics are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Explicit statistics file; defaults to `<data dir>/stats.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_path: Option<PathBuf>,
}

/// Stats report shaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsConfig {
    /// Entries shown per category.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Words shorter than this are hidden from the report (not from the file).
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_flush_interval_secs() -> u64 {
    60
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_min_word_len() -> usize {
    DEFAULT_MIN_WORD_LEN
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_word_len: default_min_word_len(),
        }
    }
}

impl StatsConfig {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.top_n,
            min_word_len: self.min_word_len,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate keytally data directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDataDir`] when the base directory cannot
/// be determined from the environment.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    platform_data_dir().ok_or(ConfigError::NoPlatformDataDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDataDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("config.toml"))
}

/// Resolves the statistics file: the configured path, or the default one
/// inside the data directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDataDir`] when no path is configured and
/// the data directory cannot be determined.
pub fn resolve_stats_path(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    match &config.storage.stats_path {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join(STATS_FILE_NAME)),
    }
}

/// Loads `AppConfig` from the default location, returning
/// `AppConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning defaults if it does not exist.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform data directory including the `keytally` subdirectory.
fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Keytally"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keytally"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/Keytally
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Keytally")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
