//! Moves finished files into the backup directory

use crate::ingestion::{IngestionError, IngestionResult};
use log::{error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Best-effort relocation of files into a backup directory
#[derive(Debug, Clone)]
pub struct BackupRelocator {
    backup_dir: PathBuf,
}

impl BackupRelocator {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Move `path` into the backup directory, logging instead of failing.
    ///
    /// Returns whether the file was moved. Callers must not change their own
    /// outcome based on it.
    pub fn relocate(&self, path: &Path) -> bool {
        match self.move_to_backup(path) {
            Ok(target) => {
                info!("Moved file to backup: {}", target.display());
                true
            }
            Err(e) => {
                error!("Failed to move {} to backup: {}", path.display(), e);
                false
            }
        }
    }

    fn move_to_backup(&self, path: &Path) -> IngestionResult<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| {
            IngestionError::relocation_failure(format!("{} has no file name", path.display()))
        })?;

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            IngestionError::relocation_failure(format!(
                "cannot create {}: {}",
                self.backup_dir.display(),
                e
            ))
        })?;

        // rename and copy both replace an existing file of the same name
        let target = self.backup_dir.join(file_name);
        move_file(path, &target)
            .map_err(|e| IngestionError::relocation_failure(e.to_string()))?;
        Ok(target)
    }
}

/// Rename, or copy and remove when source and target are on different devices
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
