//! Runtime configuration
//!
//! Command-line values win; anything left unset falls back to environment
//! variables (a `.env` file is loaded first by the binary) and then defaults.

use crate::schema::ComparisonMode;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "cars_db";
pub const DEFAULT_ERROR_LOG: &str = "error_log.txt";

pub const ENV_DATABASE: &str = "SQL_ASSISTANT_DB";
pub const ENV_ERROR_LOG: &str = "SQL_ASSISTANT_ERROR_LOG";
pub const ENV_STRICT_SCHEMA: &str = "SQL_ASSISTANT_STRICT_SCHEMA";

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    pub strict_schema: bool,
    pub verbose: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantConfig {
    pub database: PathBuf,
    pub error_log: PathBuf,
    pub comparison: ComparisonMode,
    pub verbose: bool,
}

impl AssistantConfig {
    /// Resolve against the process environment
    pub fn from_env(overrides: ConfigOverrides) -> Self {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve(overrides: ConfigOverrides, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = overrides
            .database
            .or_else(|| lookup(ENV_DATABASE).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let error_log = overrides
            .error_log
            .or_else(|| lookup(ENV_ERROR_LOG).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_LOG));

        let strict = overrides.strict_schema
            || lookup(ENV_STRICT_SCHEMA)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false);

        Self {
            database,
            error_log,
            comparison: if strict {
                ComparisonMode::Strict
            } else {
                ComparisonMode::NameOnly
            },
            verbose: overrides.verbose,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self::resolve(ConfigOverrides::default(), |_| None)
    }
}
