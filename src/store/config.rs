//! Configuration for local persistence.

use std::path::PathBuf;

use crate::store::error::{StoreError, StoreResult};
use crate::store::sweep::SweepConfig;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "UNDOX_DB_PATH";
/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "undox.db";

/// Where and how conversations are persisted.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// `SQLite` database file.
    pub db_path: PathBuf,
    /// Upper bound on the total size of stored values, in bytes.
    pub quota_bytes: Option<usize>,
    /// Background purge settings.
    pub sweep: SweepConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            quota_bytes: None,
            sweep: SweepConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_PATH_ENV)
            && !path.trim().is_empty()
        {
            config.db_path = PathBuf::from(path);
        }
        config
    }

    /// Set the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Limit the total stored size.
    #[must_use]
    pub const fn with_quota_bytes(mut self, quota: usize) -> Self {
        self.quota_bytes = Some(quota);
        self
    }

    /// Replace the sweep settings.
    #[must_use]
    pub const fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the path is empty or the sweep interval is zero.
    pub fn validate(&self) -> StoreResult<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(StoreError::Config("db_path must not be empty".to_string()));
        }
        if self.sweep.interval_seconds == 0 {
            return Err(StoreError::Config("sweep interval must be > 0".to_string()));
        }
        Ok(())
    }
}
