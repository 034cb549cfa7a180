//! `FleetQL` Configuration Module
//!
//! Provides configuration file support via `fleetql.toml`, environment variables,
//! and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`FLEETQL_*`)
//! 3. Configuration file (`fleetql.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Query evaluation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Compare string values ignoring case (equality, membership and wildcards).
    pub ignore_case: bool,
    /// Number of parsed expressions kept in the LRU cache.
    pub cache_size: usize,
    /// Longest accepted filter string, in bytes.
    pub max_query_length: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ignore_case: false,
            cache_size: 1000,
            max_query_length: 4096,
        }
    }
}

/// Paging section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when the request carries no `limit`.
    pub default_limit: usize,
    /// Upper bound for `limit`; larger requests are clamped.
    pub max_limit: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
        }
    }
}

/// Controller polling section, used to compute `${OVERDUE_TS}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverdueConfig {
    /// Expected interval between two controller polls, in seconds.
    pub polling_interval_secs: u64,
    /// Grace period after a missed poll, in seconds.
    pub overdue_interval_secs: u64,
}

impl Default for OverdueConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: 300,
            overdue_interval_secs: 300,
        }
    }
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// JSON file loaded into the in-memory store at startup (empty = none).
    pub seed_file: String,
    /// Enable permissive CORS.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            seed_file: String::new(),
            cors_enabled: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `FleetQL` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FleetQlConfig {
    /// Query configuration.
    pub query: QueryConfig,
    /// Paging configuration.
    pub paging: PagingConfig,
    /// Overdue computation configuration.
    pub overdue: OverdueConfig,
    /// Server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl FleetQlConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("fleetql.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("FLEETQL_").split("__").lowercase(true));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "paging.max_limit".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if !(1..=self.paging.max_limit).contains(&self.paging.default_limit) {
            return Err(ConfigError::InvalidValue {
                key: "paging.default_limit".to_string(),
                message: format!(
                    "value {} is out of range [1, {}]",
                    self.paging.default_limit, self.paging.max_limit
                ),
            });
        }

        if self.query.cache_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "query.cache_size".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.query.max_query_length < 16 {
            return Err(ConfigError::InvalidValue {
                key: "query.max_query_length".to_string(),
                message: format!("value {} must be >= 16", self.query.max_query_length),
            });
        }

        if self.overdue.polling_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "overdue.polling_interval_secs".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.server.port < 1024 {
            return Err(ConfigError::InvalidValue {
                key: "server.port".to_string(),
                message: format!("value {} must be >= 1024", self.server.port),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
