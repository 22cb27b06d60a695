//! # Logging System
//!
//! Installs an `env_logger` backend behind the `log` facade, configured from
//! [`LogConfig`]. `RUST_LOG`, when set, is applied on top of the configured
//! levels.

pub mod config;

pub use config::{parse_level, LogConfig};

use once_cell::sync::OnceCell;
use std::io::Write;

/// Configuration the backend was installed with
static LOGGING_CONFIG: OnceCell<LogConfig> = OnceCell::new();

/// Process-wide logging setup
pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with default configuration
    pub fn init_default() -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::default())
    }

    /// Initialize the logging system with a custom configuration
    pub fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        config.validate()?;

        let mut builder = env_logger::Builder::new();
        builder.filter_level(parse_level(&config.default_level)?);
        for (module, level) in &config.features {
            builder.filter_module(module, parse_level(level)?);
        }
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }

        if config.include_timestamp {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {:<5} [{}] {}",
                    buf.timestamp_millis(),
                    record.level(),
                    record.target(),
                    record.args()
                )
            });
        } else {
            builder.format(|buf, record| {
                writeln!(buf, "{:<5} [{}] {}", record.level(), record.target(), record.args())
            });
        }

        LOGGING_CONFIG
            .set(config)
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        builder
            .try_init()
            .map_err(|e| LoggingError::Config(format!("Failed to install logger: {}", e)))
    }

    /// Get the configuration the logger was installed with
    pub fn get_config() -> Option<&'static LogConfig> {
        LOGGING_CONFIG.get()
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Configuration error: {0}")]
    Config(String),
}
