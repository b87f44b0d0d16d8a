//! Portal Configuration
//!
//! Settings read from `PORTAL_*` environment variables, each with a logged
//! default.

use log::{info, warn};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use thiserror::Error;

use crate::search::SearchOptions;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid { key: String, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// SQLite file, or `:memory:`
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// JSON array of service records imported at startup
    pub seed_file: Option<PathBuf>,
    pub search: SearchOptions,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn load<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let search = SearchOptions {
            min_query_len: try_load(&lookup, "PORTAL_SEARCH_MIN_QUERY", "2")?,
            max_results: try_load(&lookup, "PORTAL_SEARCH_MAX_RESULTS", "5")?,
        };
        if search.max_results == 0 {
            return Err(ConfigError::Invalid {
                key: "PORTAL_SEARCH_MAX_RESULTS".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            db_path: try_load(&lookup, "PORTAL_DB_PATH", "portal.db")?,
            log_dir: try_load(&lookup, "PORTAL_LOG_DIR", "logs")?,
            seed_file: lookup("PORTAL_SEED_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            search,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }
    })
}
