//! Configuration for shardline routing.
//!
//! This module provides layered configuration with support for:
//! - Default values (embedded in binary)
//! - Configuration files (TOML format)
//! - Environment variable overrides (prefix: `SHARDLINE__`)
//!
//! # Environment Variables
//!
//! - `SHARDLINE__ROUTING__USE_BINARY_SEARCH=true`
//! - `SHARDLINE__ROUTING__REQUIRE_CURRENT_EPOCH=false`
//! - `SHARDLINE__LOGGING__LEVEL=debug`
//! - `SHARDLINE__LOGGING__JSON=1`
//!
//! # Example
//!
//! ```ignore
//! use shardline_router::config::ShardlineConfig;
//!
//! // Load from file with env overrides
//! let config = ShardlineConfig::load(Some("shardline.toml")).unwrap();
//! println!("Binary search: {}", config.routing.use_binary_search);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const ENV_PREFIX: &str = "SHARDLINE__";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardlineConfig {
    /// Shard resolution behaviour
    pub routing: RoutingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ShardlineConfig {
    /// Loads configuration from an optional file path with environment variable overrides.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (SHARDLINE__*)
    /// 2. Configuration file (if provided and present)
    /// 3. Built-in defaults
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(file_path) = path {
            if Path::new(file_path).exists() {
                let contents = std::fs::read_to_string(file_path)?;
                config = toml::from_str(&contents)?;
            }
        }

        config.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok());

        Ok(config)
    }

    /// Applies overrides looked up by `SECTION__FIELD` key.
    ///
    /// Flag values other than `true` or `1` read as false.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ROUTING__USE_BINARY_SEARCH") {
            self.routing.use_binary_search = parse_flag(&val);
        }
        if let Some(val) = lookup("ROUTING__REQUIRE_CURRENT_EPOCH") {
            self.routing.require_current_epoch = parse_flag(&val);
        }

        if let Some(val) = lookup("LOGGING__LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("LOGGING__JSON") {
            self.logging.json = parse_flag(&val);
        }
    }

    /// Serializes the configuration to TOML format.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Shard resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Resolve hash tables by binary search instead of bucket arithmetic
    pub use_binary_search: bool,
    /// Refuse to route against a snapshot older or newer than expected
    pub require_current_epoch: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            use_binary_search: false,
            require_current_epoch: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Use JSON format for log output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
