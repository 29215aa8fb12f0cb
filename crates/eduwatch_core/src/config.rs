//! Process configuration.
//!
//! # Responsibility
//! - Resolve store path and logging settings from the environment.
//!
//! # Invariants
//! - Every setting has a default; a missing variable is never an error.
//! - Blank values are treated as unset.

use crate::logging::{default_log_level, LogTarget};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "EDUWATCH_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "EDUWATCH_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "EDUWATCH_LOG_DIR";

const DEFAULT_DB_PATH: &str = "eduwatch.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Rotated log files go here; stderr when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `EDUWATCH_DB_PATH`, `EDUWATCH_LOG_LEVEL` and `EDUWATCH_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(DB_PATH_VAR).map_or(defaults.db_path, PathBuf::from),
            log_level: read(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
        }
    }

    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Directory(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}
