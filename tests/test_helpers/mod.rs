#![allow(dead_code)]


use request_ingest::db_operations::RecordStore;
use request_ingest::ingestion::SourceReader;
use request_ingest::{
    BackupRelocator, DirectoryScanner, FileIngestionWorker, IngestionError, IngestionResult,
    RequestBatch,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use tempfile::TempDir;

/// Record store double that keeps every saved batch in memory
#[derive(Default)]
pub struct RecordingStore {
    saved: Mutex<Vec<RequestBatch>>,
    fail: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every save fails
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn saves(&self) -> Vec<RequestBatch> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

impl RecordStore for RecordingStore {
    fn save(&self, batch: &RequestBatch) -> IngestionResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(IngestionError::persistence_failure("simulated store outage"));
        }
        self.saved.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

/// Reader that reports permission denied, like a file held by another writer
pub struct DeniedReader;

impl SourceReader for DeniedReader {
    fn read(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }
}

/// Reader that fails with a non-permission I/O error
pub struct BrokenReader;

impl SourceReader for BrokenReader {
    fn read(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::Other, "device error"))
    }
}

/// Reader that denies access for the first `denials` reads, then reads normally
pub struct FlakyReader {
    denials: usize,
    reads: AtomicUsize,
}

impl FlakyReader {
    pub fn new(denials: usize) -> Self {
        Self {
            denials,
            reads: AtomicUsize::new(0),
        }
    }
}

impl SourceReader for FlakyReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.denials {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        fs::read(path)
    }
}

/// Reader that parks inside `read` until the test releases it.
///
/// `entered` and `release` are two-party barriers shared with the test thread.
pub struct GatedReader {
    pub entered: Arc<Barrier>,
    pub release: Arc<Barrier>,
}

impl GatedReader {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Barrier::new(2)),
            release: Arc::new(Barrier::new(2)),
        }
    }
}

impl SourceReader for GatedReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.entered.wait();
        self.release.wait();
        fs::read(path)
    }
}

/// Temp input/backup directories plus a recording store
pub struct Fixture {
    pub dir: TempDir,
    pub input: PathBuf,
    pub backup: PathBuf,
    pub store: Arc<RecordingStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_store(RecordingStore::new())
    }

    pub fn with_store(store: RecordingStore) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let backup = dir.path().join("backup");
        fs::create_dir_all(&input).unwrap();
        Self {
            dir,
            input,
            backup,
            store: Arc::new(store),
        }
    }

    pub fn worker(&self) -> FileIngestionWorker {
        FileIngestionWorker::new(self.store.clone(), BackupRelocator::new(&self.backup))
    }

    pub fn worker_with_reader(&self, reader: Arc<dyn SourceReader>) -> FileIngestionWorker {
        self.worker().with_reader(reader)
    }

    pub fn scanner(&self) -> DirectoryScanner {
        DirectoryScanner::new(&self.input, ".xml", self.worker())
    }

    pub fn scanner_with_reader(&self, reader: Arc<dyn SourceReader>) -> DirectoryScanner {
        DirectoryScanner::new(&self.input, ".xml", self.worker_with_reader(reader))
    }

    /// Write a file into the input directory
    pub fn write_input(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.input.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn in_input(&self, name: &str) -> bool {
        self.input.join(name).exists()
    }

    pub fn in_backup(&self, name: &str) -> bool {
        self.backup.join(name).exists()
    }
}
