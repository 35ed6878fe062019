//! Worker entry point: loads configuration, wires the in-memory adapters to
//! an [`EngineContext`], starts the sync manager for every configured
//! repository, and polls the job queues until `ctrl_c` is observed.

use std::sync::Arc;
use std::time::Duration;

use lumilio_core::memory::{
    MemoryCatalog, MemoryFileRecordStore, MemoryQueue, MemoryStorage, MemorySyncOperationStore,
};
use lumilio_core::ml::MlClient;
use lumilio_core::sync::{FileWatcher, ReconciliationScanner, SyncManager};
use lumilio_core::EngineContext;
use lumilio_model::jobs::{
    QUEUE_METADATA, QUEUE_PROCESS_CAPTION, QUEUE_PROCESS_CLIP, QUEUE_PROCESS_FACE,
    QUEUE_PROCESS_OCR, QUEUE_RETRY_ASSET, QUEUE_THUMBNAIL, QUEUE_TRANSCODE,
};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Every queue the dispatcher knows how to route, polled in round-robin.
const QUEUES: &[&str] = &[
    QUEUE_METADATA,
    QUEUE_THUMBNAIL,
    QUEUE_TRANSCODE,
    QUEUE_PROCESS_CLIP,
    QUEUE_PROCESS_OCR,
    QUEUE_PROCESS_CAPTION,
    QUEUE_PROCESS_FACE,
    QUEUE_RETRY_ASSET,
];

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumilio_worker=info,lumilio_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("LUMILIO_CONFIG").ok().map(std::path::PathBuf::from);
    let config = lumilio_config::load(config_path.as_deref())?;
    info!(repositories = config.repositories.len(), "configuration loaded");

    let storage = Arc::new(MemoryStorage::new());
    for repository in &config.repositories {
        storage.add_repository(repository.clone()).await;
    }
    let catalog = Arc::new(MemoryCatalog::default());
    let job_queue = Arc::new(MemoryQueue::new());
    let ml_client = Arc::new(MlClient::new(config.ml_service_url.clone()));

    let ctx = EngineContext {
        storage: storage.clone(),
        catalog,
        queue: job_queue.clone(),
        ml_client,
        feature_flags: config.feature_flags,
    };

    let file_records = Arc::new(MemoryFileRecordStore::default());
    let sync_operations = Arc::new(MemorySyncOperationStore::new());
    let generations = lumilio_core::sync::ScanGenerations::default();

    let watcher = Arc::new(FileWatcher::new(file_records.clone(), generations.clone()));
    let scanner = Arc::new(ReconciliationScanner::new(file_records, sync_operations, generations));

    let (sync_shutdown_tx, sync_shutdown_rx) = mpsc::channel(1);
    let sync_manager = Arc::new(SyncManager::new(storage, watcher, scanner, sync_shutdown_rx));

    for repository in &config.repositories {
        if let Err(e) = sync_manager.add_repository(repository.clone()).await {
            error!(repository = %repository.name, "failed to register repository with sync manager: {e}");
        }
    }

    let sync_task = tokio::spawn(sync_manager.clone().run());

    let poll_cancel = CancellationToken::new();
    let poll_task = tokio::spawn(poll_queues(ctx, job_queue, poll_cancel.clone()));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight jobs");

    poll_cancel.cancel();
    let _ = sync_shutdown_tx.send(()).await;

    let _ = poll_task.await;
    let _ = sync_task.await;

    info!("worker shut down cleanly");
    Ok(())
}

/// Round-robins every known queue, popping and dispatching one job at a
/// time. The in-memory queue never blocks a consumer, so this is a poll
/// loop rather than a subscription.
async fn poll_queues(ctx: EngineContext, memory_queue: Arc<MemoryQueue>, cancel: CancellationToken) {
    let mut ticker = interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => return,
        }

        for &queue_name in QUEUES {
            while let Some(payload) = memory_queue.pop(queue_name).await {
                if let Err(e) = lumilio_core::dispatch(&ctx, queue_name, &payload).await {
                    warn!(queue = queue_name, "job dispatch failed: {e}");
                }
            }
        }
    }
}
