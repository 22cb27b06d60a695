//! One pass over the input directory

use crate::ingestion::config::IngestConfig;
use crate::ingestion::worker::FileIngestionWorker;
use crate::ingestion::{IngestionError, IngestionResult};
use log::{debug, error, info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Scan ran; number of candidate files found
    Completed(usize),
    /// Directory could not be prepared or listed; retried next tick
    SetupFailed,
    /// Another scan was still running
    Skipped,
}

/// Lists candidate files and hands each one to the worker, in name order.
pub struct DirectoryScanner {
    input_dir: PathBuf,
    file_suffix: String,
    worker: FileIngestionWorker,
    in_progress: AtomicBool,
}

impl DirectoryScanner {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        file_suffix: impl Into<String>,
        worker: FileIngestionWorker,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            file_suffix: file_suffix.into(),
            worker,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &IngestConfig, worker: FileIngestionWorker) -> Self {
        Self::new(&config.input_dir, &config.file_suffix, worker)
    }

    /// Whether a scan is currently running
    pub fn is_scanning(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Run one scan. Never fails; setup errors are logged and reported.
    pub fn run_once(&self) -> ScanOutcome {
        let Some(_guard) = ScanGuard::acquire(&self.in_progress) else {
            warn!("Previous scan still in progress, skipping this one");
            return ScanOutcome::Skipped;
        };

        match self.scan() {
            Ok(found) => {
                info!("Files found in directory: {}", found);
                ScanOutcome::Completed(found)
            }
            Err(e) => {
                error!("I/O error during file processing setup: {}", e);
                ScanOutcome::SetupFailed
            }
        }
    }

    fn scan(&self) -> IngestionResult<usize> {
        let dir = self.resolve_input_dir()?;
        debug!("Working directory: {}", dir.display());

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                IngestionError::scan_setup_failure(format!(
                    "cannot create {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let candidates = self.list_candidates(&dir)?;
        for path in &candidates {
            let outcome = self.worker.process(path);
            debug!("{} -> {:?}", path.display(), outcome);
        }
        Ok(candidates.len())
    }

    /// Entries of `dir` whose name ends with the configured suffix
    pub fn list_candidates(&self, dir: &Path) -> IngestionResult<Vec<PathBuf>> {
        let listing_error = |e: std::io::Error| {
            IngestionError::scan_setup_failure(format!("cannot list {}: {}", dir.display(), e))
        };

        let mut candidates = Vec::new();
        for entry in fs::read_dir(dir).map_err(listing_error)? {
            let entry = entry.map_err(listing_error)?;
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(self.file_suffix.as_str()));
            if matches {
                candidates.push(entry.path());
            }
        }
        candidates.sort();
        Ok(candidates)
    }

    fn resolve_input_dir(&self) -> IngestionResult<PathBuf> {
        if self.input_dir.is_absolute() {
            return Ok(self.input_dir.clone());
        }
        let cwd = env::current_dir().map_err(|e| {
            IngestionError::scan_setup_failure(format!("cannot resolve working directory: {}", e))
        })?;
        Ok(cwd.join(&self.input_dir))
    }
}

/// Holds the in-progress flag for the duration of one scan
struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
