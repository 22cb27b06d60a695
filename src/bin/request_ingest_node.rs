use clap::Parser;
use log::{error, info};
use request_ingest::{
    BackupRelocator, DbOperations, DirectoryScanner, FileIngestionWorker, IngestConfig,
    LoggingSystem, Scheduler,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Polls a directory for XML requests and stores them
#[derive(Parser, Debug)]
#[command(name = "request_ingest_node", version)]
struct Cli {
    /// TOML config file (overrides INGEST_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single scan and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = IngestConfig::load(cli.config.as_deref())?;
    LoggingSystem::init_with_config(config.logging.clone())?;

    info!(
        "Starting ingestion: input={} backup={} storage={} interval={}ms",
        config.input_dir.display(),
        config.backup_dir.display(),
        config.storage_path.display(),
        config.poll_interval_ms
    );

    let store = Arc::new(DbOperations::open(&config.storage_path)?);
    info!("Record store opened with {} request batches", store.batch_count());

    let worker = FileIngestionWorker::new(store, BackupRelocator::new(&config.backup_dir));
    let scanner = Arc::new(DirectoryScanner::from_config(&config, worker));
    let scheduler = Scheduler::from_config(&config, scanner);

    if cli.once {
        let outcome = scheduler.tick().await;
        info!("Single scan finished: {:?}", outcome);
        return Ok(());
    }

    scheduler
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    error!("Cannot listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await
                }
            }
        })
        .await;

    Ok(())
}
