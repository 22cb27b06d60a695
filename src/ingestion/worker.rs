//! Per-file ingestion: validate, decode, map, persist, relocate.

use crate::db_operations::RecordStore;
use crate::ingestion::backup::BackupRelocator;
use crate::ingestion::document::RootRequest;
use crate::ingestion::mapper::RecordMapper;
use crate::ingestion::{IngestionError, IngestionResult};
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

/// Terminal state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Missing, or not a regular file
    SkippedNotRegular,
    /// No read permission; left in place
    SkippedUnreadable,
    /// Permission denied on open; left in place for the next scan
    SkippedLocked,
    /// Blank document; quarantined
    SkippedEmptyDocument,
    /// Document without `<requestDetails>`; quarantined
    SkippedNoRequestDetails,
    /// Saved, then moved to backup
    Persisted,
    /// Decode, mapping or persistence failed; quarantined
    Failed,
}

impl FileOutcome {
    /// Whether the file is moved to the backup directory for this outcome
    pub fn relocates(self) -> bool {
        matches!(
            self,
            Self::SkippedEmptyDocument
                | Self::SkippedNoRequestDetails
                | Self::Persisted
                | Self::Failed
        )
    }
}

/// Source of raw file bytes
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads files from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Drives one file through the ingestion lifecycle.
///
/// Never returns an error: every failure ends in a [`FileOutcome`] so that one
/// bad file cannot abort a scan.
pub struct FileIngestionWorker {
    store: Arc<dyn RecordStore>,
    mapper: RecordMapper,
    backup: BackupRelocator,
    reader: Arc<dyn SourceReader>,
}

impl FileIngestionWorker {
    pub fn new(store: Arc<dyn RecordStore>, backup: BackupRelocator) -> Self {
        Self {
            store,
            mapper: RecordMapper::new(),
            backup,
            reader: Arc::new(FsSourceReader),
        }
    }

    /// Replace the reader used to load file contents
    pub fn with_reader(mut self, reader: Arc<dyn SourceReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Process a single candidate file
    pub fn process(&self, path: &Path) -> FileOutcome {
        let outcome = self.evaluate(path);
        if outcome.relocates() {
            self.backup.relocate(path);
        }
        outcome
    }

    /// Decide the terminal state of `path`, saving it when possible
    fn evaluate(&self, path: &Path) -> FileOutcome {
        match check_file_state(path) {
            Err(IngestionError::NotRegularOrMissing(_)) => {
                warn!("Skipping non-regular or missing file: {}", path.display());
                return FileOutcome::SkippedNotRegular;
            }
            Err(_) => {
                warn!(
                    "Skipping unreadable file (may be locked by another process): {}",
                    path.display()
                );
                return FileOutcome::SkippedUnreadable;
            }
            Ok(()) => {}
        }

        let document = match self.decode(path) {
            Ok(document) => document,
            Err(e) if e.is_retryable() => {
                warn!("Access denied when reading file (will retry later): {}", path.display());
                return FileOutcome::SkippedLocked;
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                return FileOutcome::Failed;
            }
        };

        let Some(document) = document else {
            warn!("Skipping file, empty document: {}", path.display());
            return FileOutcome::SkippedEmptyDocument;
        };

        if document.request_details.is_none() {
            warn!("Skipping file, no requestDetails: {}", path.display());
            return FileOutcome::SkippedNoRequestDetails;
        }

        match self.persist(&document) {
            Ok(request_id) => {
                info!("Saved request {} from file: {}", request_id, file_name(path));
                FileOutcome::Persisted
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                FileOutcome::Failed
            }
        }
    }

    fn decode(&self, path: &Path) -> IngestionResult<Option<RootRequest>> {
        let bytes = self.reader.read(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => {
                IngestionError::access_denied(path.display().to_string())
            }
            _ => IngestionError::decode_failure(format!("cannot read {}: {}", path.display(), e)),
        })?;

        let text = String::from_utf8(bytes).map_err(|e| {
            IngestionError::decode_failure(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;

        Ok(RootRequest::from_xml(text.trim_start_matches('\u{feff}'))?)
    }

    fn persist(&self, document: &RootRequest) -> IngestionResult<String> {
        let batch = self.mapper.map(document)?;
        self.store.save(&batch)?;
        Ok(batch.id)
    }
}

/// Existence, regular-file and readability checks
fn check_file_state(path: &Path) -> IngestionResult<()> {
    let metadata = fs::metadata(path)
        .map_err(|_| IngestionError::NotRegularOrMissing(path.display().to_string()))?;
    if !metadata.is_file() {
        return Err(IngestionError::NotRegularOrMissing(path.display().to_string()));
    }
    if !is_readable(&metadata) {
        return Err(IngestionError::Unreadable(path.display().to_string()));
    }
    Ok(())
}

/// Read permission as recorded in the mode bits.
///
/// This is not an access check: a process that bypasses permissions (root)
/// still sees a `0o000` file as unreadable and leaves it in place on every scan.
#[cfg(unix)]
fn is_readable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o444 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &fs::Metadata) -> bool {
    true
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
