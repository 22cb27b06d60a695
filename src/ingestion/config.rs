//! Configuration for the ingestion pipeline

use crate::ingestion::{IngestionError, IngestionResult};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "INGEST_CONFIG";

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory polled for incoming documents
    pub input_dir: PathBuf,
    /// Directory processed and quarantined files are moved into
    pub backup_dir: PathBuf,
    /// Case-sensitive file name suffix of ingestible files
    pub file_suffix: String,
    /// Delay between the end of one scan and the start of the next
    pub poll_interval_ms: u64,
    /// Delay before the first scan
    pub initial_delay_ms: u64,
    /// Directory of the embedded record store
    pub storage_path: PathBuf,
    /// Logging settings
    pub logging: LogConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            backup_dir: PathBuf::from("backup"),
            file_suffix: ".xml".to_string(),
            poll_interval_ms: 60_000,
            initial_delay_ms: 0,
            storage_path: PathBuf::from("data"),
            logging: LogConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// An explicit `path` wins over `INGEST_CONFIG`. Environment variables are
    /// applied last.
    pub fn load(path: Option<&Path>) -> IngestionResult<Self> {
        let from_env_path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let file = path.map(Path::to_path_buf).or(from_env_path);

        let base = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> IngestionResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            IngestionError::configuration_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply `INGEST_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var("INGEST_INPUT_DIR") {
            self.input_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("INGEST_BACKUP_DIR") {
            self.backup_dir = PathBuf::from(dir);
        }
        if let Ok(suffix) = env::var("INGEST_FILE_SUFFIX") {
            self.file_suffix = suffix;
        }
        if let Ok(dir) = env::var("INGEST_STORAGE_PATH") {
            self.storage_path = PathBuf::from(dir);
        }
        if let Ok(level) = env::var("INGEST_LOG_LEVEL") {
            self.logging.default_level = level;
        }

        self.poll_interval_ms = env::var("INGEST_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.poll_interval_ms);

        self.initial_delay_ms = env::var("INGEST_INITIAL_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.initial_delay_ms);

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> IngestionResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(IngestionError::configuration_error(
                "poll_interval_ms must be greater than zero",
            ));
        }
        if self.file_suffix.is_empty() {
            return Err(IngestionError::configuration_error(
                "file_suffix must not be empty",
            ));
        }
        if self.input_dir == self.backup_dir {
            return Err(IngestionError::configuration_error(
                "input_dir and backup_dir must differ",
            ));
        }
        self.logging
            .validate()
            .map_err(|e| IngestionError::configuration_error(e.to_string()))
    }

    /// Delay between scans
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay before the first scan
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}
