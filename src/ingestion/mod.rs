//! # Ingestion Module
//!
//! Polls a directory for XML request documents, stores each one as a record
//! graph and moves the file to a backup directory once it reaches a terminal
//! outcome.
//!
//! ## Components
//!
//! * `field_parser` - Tolerant conversion of text fields into typed values
//! * `document` - XML wire format
//! * `mapper` - Document to record graph mapping
//! * `backup` - Best-effort relocation into the backup directory
//! * `worker` - Per-file lifecycle
//! * `scanner` - One pass over the input directory
//! * `scheduler` - Fixed-delay, non-overlapping scan loop
//! * `config` - Pipeline configuration
//! * `error` - Error types for ingestion operations
//!
//! ## Failure handling
//!
//! Permission denied while opening a file is the only condition treated as
//! transient: the file stays where it is and the next scan picks it up again.
//! Every other failure quarantines the file in the backup directory.

pub mod backup;
pub mod config;
pub mod document;
pub mod error;
pub mod field_parser;
pub mod mapper;
pub mod scanner;
pub mod scheduler;
pub mod worker;

// Public re-exports
pub use backup::BackupRelocator;
pub use config::IngestConfig;
pub use document::RootRequest;
pub use error::IngestionError;
pub use mapper::RecordMapper;
pub use scanner::{DirectoryScanner, ScanOutcome};
pub use scheduler::Scheduler;
pub use worker::{FileIngestionWorker, FileOutcome, FsSourceReader, SourceReader};

/// Result type for ingestion operations
pub type IngestionResult<T> = Result<T, IngestionError>;
