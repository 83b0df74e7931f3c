//! Configuration management for Quarry.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every constant that governs quota,
//! pacing and pagination lives here so deployments can tune it.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// Loaded from `~/.config/quarry/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-account daily quotas
    pub quota: QuotaConfig,
    /// Delay between consecutive requests of one account
    pub pacing: PacingConfig,
    /// Keyword search pagination
    pub search: SearchConfig,
    /// Worker pool behavior
    pub harvest: HarvestConfig,
    /// Network egress leasing
    pub egress: EgressConfig,
    /// Dataset persistence
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML or fail validation
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        let config: Self = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `QUARRY_SEARCH_LIMIT`: Override the per-account daily search limit
    /// - `QUARRY_VISIT_LIMIT`: Override the per-account daily visit limit
    /// - `QUARRY_USE_EGRESS`: Enable or disable egress leasing (true/false)
    /// - `QUARRY_DATA_DIR`: Override the dataset directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUARRY_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("QUARRY_SEARCH_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.quota.search_limit_per_account = limit;
                tracing::debug!("Override quota.search_limit_per_account from env: {}", limit);
            }
        }

        if let Ok(val) = std::env::var("QUARRY_VISIT_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.quota.visit_limit_per_account = limit;
                tracing::debug!("Override quota.visit_limit_per_account from env: {}", limit);
            }
        }

        if let Ok(val) = std::env::var("QUARRY_USE_EGRESS") {
            if let Ok(enabled) = val.parse() {
                self.egress.enabled = enabled;
                tracing::debug!("Override egress.enabled from env: {}", enabled);
            }
        }

        if let Ok(val) = std::env::var("QUARRY_DATA_DIR") {
            tracing::debug!("Override store.data_dir from env: {}", val);
            self.store.data_dir = Some(PathBuf::from(val));
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.quota.search_limit_per_account == 0 {
            return Err(invalid("quota.search_limit_per_account", "must be greater than zero"));
        }
        if self.quota.visit_limit_per_account == 0 {
            return Err(invalid("quota.visit_limit_per_account", "must be greater than zero"));
        }
        if self.quota.day_length_secs <= 0 {
            return Err(invalid("quota.day_length_secs", "must be positive"));
        }
        if !(self.pacing.min_delay_secs >= 0.0
            && self.pacing.min_delay_secs <= self.pacing.max_delay_secs)
        {
            return Err(invalid(
                "pacing",
                "min_delay_secs must be non-negative and not exceed max_delay_secs",
            ));
        }
        if self.search.page_size == 0 {
            return Err(invalid("search.page_size", "must be greater than zero"));
        }
        if self.harvest.fetch_timeout_secs == 0 {
            return Err(invalid("harvest.fetch_timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/quarry/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "quarry", "quarry").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Directory holding the datasets and ledger.
    ///
    /// `store.data_dir` when set, otherwise `~/.local/share/quarry`.
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.store.data_dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("com", "quarry", "quarry").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Per-account daily usage limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Maximum search calls per account per day
    pub search_limit_per_account: u32,
    /// Maximum detail fetches per account per day
    pub visit_limit_per_account: u32,
    /// Seconds after which all counters reset
    pub day_length_secs: i64,
    /// Search counter increment per search call (independent of results returned)
    pub search_call_cost: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            search_limit_per_account: 900,
            visit_limit_per_account: 80,
            day_length_secs: 86_400,
            search_call_cost: 1,
        }
    }
}

/// Randomized delay between consecutive items handled by one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of the delay in seconds
    pub min_delay_secs: f64,
    /// Upper bound of the delay in seconds
    pub max_delay_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 30.0,
            max_delay_secs: 33.5,
        }
    }
}

/// Keyword search pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results requested per page
    pub page_size: u32,
    /// A page shorter than this ends the search for the keyword
    pub min_page_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 49,
            min_page_threshold: 3,
        }
    }
}

/// Worker pool behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Upper bound on a single fetch; a timeout counts as a failed item
    pub fetch_timeout_secs: u64,
    /// Logins file, one `account:secret` per line
    pub logins_file: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 90,
            logins_file: PathBuf::from("input.txt"),
        }
    }
}

/// Network egress leasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EgressConfig {
    /// Lease a dedicated egress per account; when false, all traffic goes direct
    pub enabled: bool,
    /// Proxy URLs available for leasing
    pub proxies: Vec<String>,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            proxies: Vec::new(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendKind {
    /// One JSON file per dataset
    #[default]
    Json,
    /// A single `SQLite` database
    Sqlite,
}

/// Dataset persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend holds the datasets
    pub backend: StoreBackendKind,
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
}
