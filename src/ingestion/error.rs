//! Error types for the ingestion pipeline

use thiserror::Error;

/// Errors that can occur while ingesting a file or running a scan
#[derive(Error, Debug)]
pub enum IngestionError {
    /// Path is missing or is not a regular file
    #[error("Not a regular file or missing: {0}")]
    NotRegularOrMissing(String),

    /// File exists but cannot be read by this process
    #[error("File is unreadable: {0}")]
    Unreadable(String),

    /// Permission denied while opening the file; the file is left in place
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Malformed XML, invalid encoding or an I/O error while reading
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Document decoded but carries nothing to ingest
    #[error("Empty document or no request details: {0}")]
    EmptyOrNoRequestDetails(String),

    /// Document could not be turned into a record graph
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The record store rejected or failed the save
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Directory-level I/O error while preparing a scan
    #[error("Scan setup failure: {0}")]
    ScanSetupFailure(String),

    /// Moving a file to the backup directory failed
    #[error("Relocation failure: {0}")]
    RelocationFailure(String),

    /// Configuration errors (bad values, unreadable config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Underlying database errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Record (de)serialization errors inside the store
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestionError {
    /// Create a new access denied error
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    /// Create a new decode failure
    pub fn decode_failure(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }

    /// Create a new mapping error
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Create a new persistence failure
    pub fn persistence_failure(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    /// Create a new scan setup failure
    pub fn scan_setup_failure(msg: impl Into<String>) -> Self {
        Self::ScanSetupFailure(msg.into())
    }

    /// Create a new relocation failure
    pub fn relocation_failure(msg: impl Into<String>) -> Self {
        Self::RelocationFailure(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the failure is expected to clear up on a later scan.
    ///
    /// Only access denied qualifies: a concurrent writer may still hold the
    /// file. Everything else is treated as durable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}

impl From<quick_xml::DeError> for IngestionError {
    fn from(error: quick_xml::DeError) -> Self {
        Self::DecodeFailure(error.to_string())
    }
}

impl From<toml::de::Error> for IngestionError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}
