//! Configuration for the logging system
//!
//! Holds the default level and per-module ("feature") overrides. Loaded as part
//! of the ingestion config file or built in code.

use super::LoggingError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level for all modules
    pub default_level: String,
    /// Include millisecond timestamps in every line
    pub include_timestamp: bool,
    /// Module-specific log levels, keyed by module path
    pub features: HashMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let mut features = HashMap::new();
        // sled is chatty at debug
        features.insert("sled".to_string(), "WARN".to_string());

        Self {
            default_level: "INFO".to_string(),
            include_timestamp: true,
            features,
        }
    }
}

impl LogConfig {
    /// Validate every level string in the configuration
    pub fn validate(&self) -> Result<(), LoggingError> {
        parse_level(&self.default_level)?;
        for level in self.features.values() {
            parse_level(level)?;
        }
        Ok(())
    }

    /// Set the level for a single module path
    pub fn with_feature_level(mut self, module: &str, level: &str) -> Self {
        self.features.insert(module.to_string(), level.to_string());
        self
    }
}

/// Parse a level name into a `LevelFilter`
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(LevelFilter::Trace),
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARN" => Ok(LevelFilter::Warn),
        "ERROR" => Ok(LevelFilter::Error),
        "OFF" => Ok(LevelFilter::Off),
        _ => Err(LoggingError::Config(format!("Invalid log level: {}", level))),
    }
}
