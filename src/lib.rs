//! # Request Ingest
//!
//! Scheduled ingestion of XML request documents into an embedded record store.
//!
//! ## Core Components
//!
//! * `ingestion` - Directory scanning, per-file lifecycle, mapping and backup
//! * `records` - The request → event → product record graph
//! * `db_operations` - sled-backed record store and read-side queries
//! * `logging` - Logger installation and level configuration
//!
//! ## Architecture
//!
//! A [`Scheduler`] triggers a [`DirectoryScanner`] on a fixed delay. The scanner
//! hands every matching file to a [`FileIngestionWorker`], which decodes it,
//! maps it into a [`RequestBatch`], saves the whole graph in one transaction
//! through a [`RecordStore`] and then moves the file to the backup directory.

pub mod db_operations;
pub mod ingestion;
pub mod logging;
pub mod records;

// Re-export main types for convenience
pub use db_operations::{DbOperations, InsuredProducts, RecordStore};
pub use ingestion::{
    BackupRelocator, DirectoryScanner, FileIngestionWorker, FileOutcome, IngestConfig,
    IngestionError, IngestionResult, ScanOutcome, Scheduler,
};
pub use logging::{LogConfig, LoggingSystem};
pub use records::{Event, Product, RequestBatch};
