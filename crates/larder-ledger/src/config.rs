//! # Larder Configuration
//!
//! Configuration for the database, ledger policy, read cache and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LARDER_DB_PATH=/var/lib/larder/larder.db                           │
//! │     LARDER_AUTO_PROVISION=true                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/larder/larder.toml (Linux)                               │
//! │     ~/Library/Application Support/com.larder.larder/larder.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # larder.toml
//! [database]
//! path = "/var/lib/larder/larder.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [ledger]
//! auto_provision_inventory = false
//!
//! [cache]
//! ttl_secs = 300
//! sweep_interval_secs = 60
//! key_prefix = ""
//!
//! [logging]
//! filter = "info,larder=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use larder_cache::{DefaultKeyStrategy, PrefixedKeyStrategy, ReadCache, TtlCache};
use larder_db::DbConfig;

/// Longest accepted cache TTL (one week).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;

/// Longest accepted sweep interval (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 3600;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Write(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first connect.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a ledger write waits for another writer (seconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "larder", "larder")
        .map(|dirs| dirs.data_dir().join("larder.db"))
        .unwrap_or_else(|| PathBuf::from("larder.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

// =============================================================================
// Ledger Settings
// =============================================================================

/// Ledger policy switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Create a zero-quantity inventory row when a delivery arrives for an
    /// ingredient the location has never stocked. When false such a
    /// delivery fails with `NotFound`.
    /// Default: false
    #[serde(default)]
    pub auto_provision_inventory: bool,
}

// =============================================================================
// Cache Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Namespace prepended to every key. Empty means none.
    #[serde(default)]
    pub key_prefix: String,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            key_prefix: String::new(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Builds a read cache with these settings.
    pub fn read_cache<V: Clone>(&self) -> ReadCache<V, PrefixedKeyStrategy<DefaultKeyStrategy>> {
        ReadCache::new(
            TtlCache::new(self.ttl()),
            PrefixedKeyStrategy::new(self.key_prefix.clone(), DefaultKeyStrategy),
        )
    }
}

// =============================================================================
// Log Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Larder configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LarderConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub logging: LogSettings,
}

impl LarderConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`larder.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    /// [`LarderConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else if explicit {
                return Err(ConfigError::Read {
                    path,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(env);
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Write(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        let sweep = self.cache.sweep_interval_secs;
        if sweep == 0 || sweep > MAX_SWEEP_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache.sweep_interval_secs must be between 1 and {MAX_SWEEP_INTERVAL_SECS}"
            )));
        }

        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_secs must be at most {MAX_CACHE_TTL_SECS}"
            )));
        }

        Ok(())
    }

    fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env("LARDER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = env("LARDER_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid LARDER_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(flag) = env("LARDER_AUTO_PROVISION") {
            match parse_flag(&flag) {
                Some(on) => {
                    debug!(auto_provision = on, "Overriding auto-provision from environment");
                    self.ledger.auto_provision_inventory = on;
                }
                None => warn!(value = %flag, "Ignoring invalid LARDER_AUTO_PROVISION"),
            }
        }

        if let Some(ttl) = env("LARDER_CACHE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(ttl) => self.cache.ttl_secs = ttl,
                Err(_) => warn!(value = %ttl, "Ignoring invalid LARDER_CACHE_TTL_SECS"),
            }
        }

        if let Some(filter) = env("LARDER_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "larder", "larder")
            .map(|dirs| dirs.config_dir().join("larder.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
