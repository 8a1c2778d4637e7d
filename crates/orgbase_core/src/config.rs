//! Process configuration read from environment variables.
//!
//! | Variable            | Meaning                          | Default                 |
//! |---------------------|----------------------------------|-------------------------|
//! | `ORGBASE_DB_PATH`   | SQLite file path                 | unset → in-memory       |
//! | `ORGBASE_LOG_LEVEL` | `trace\|debug\|info\|warn\|error` | [`default_log_level`]   |
//! | `ORGBASE_LOG_DIR`   | absolute log directory           | unset → logging off     |
//!
//! Blank values count as unset.

use crate::logging::{default_log_level, normalize_level};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "ORGBASE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ORGBASE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ORGBASE_LOG_DIR";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value)?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level,
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        })
    }
}
