//! Fixed-delay scheduling of directory scans

use crate::ingestion::config::IngestConfig;
use crate::ingestion::scanner::{DirectoryScanner, ScanOutcome};
use log::{debug, error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Runs a scan, waits `poll_interval`, runs the next one.
///
/// The delay is measured from the end of a scan, so scans never overlap.
/// Blocking scan work runs on tokio's blocking pool.
pub struct Scheduler {
    scanner: Arc<DirectoryScanner>,
    poll_interval: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    pub fn new(
        scanner: Arc<DirectoryScanner>,
        poll_interval: Duration,
        initial_delay: Duration,
    ) -> Self {
        Self {
            scanner,
            poll_interval,
            initial_delay,
        }
    }

    pub fn from_config(config: &IngestConfig, scanner: Arc<DirectoryScanner>) -> Self {
        Self::new(scanner, config.poll_interval(), config.initial_delay())
    }

    /// Run a single scan off the async executor
    pub async fn tick(&self) -> ScanOutcome {
        let scanner = Arc::clone(&self.scanner);
        match tokio::task::spawn_blocking(move || scanner.run_once()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // A panicking scan must not stop the schedule
                error!("Scan task failed: {}", e);
                ScanOutcome::SetupFailed
            }
        }
    }

    /// Run scans until `shutdown` resolves; returns the number of scans run.
    ///
    /// Shutdown is observed between scans, never in the middle of one.
    pub async fn run_until<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            _ = &mut shutdown => {
                info!("Scheduler stopped before the first scan");
                return 0;
            }
            _ = sleep(self.initial_delay) => {}
        }

        let mut scans = 0u64;
        loop {
            debug!("Scheduled poll triggered");
            let outcome = self.tick().await;
            scans += 1;
            debug!("Scan {} finished: {:?}", scans, outcome);

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("Scheduler stopped after {} scans", scans);
        scans
    }

    /// Spawn the schedule as a background task that runs until aborted
    pub fn start(self) -> JoinHandle<u64> {
        tokio::spawn(self.run_until(std::future::pending()))
    }
}
