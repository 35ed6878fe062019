//! Sync manager: composes the watcher and the reconciliation scanner,
//! owns the reconciliation ticker, and is the lifecycle entry point a
//! worker binary drives for every configured repository.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use lumilio_model::ids::RepoID;
use lumilio_model::sync::SyncOperationType;
use lumilio_model::{EngineError, Repository, Result};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ports::StorageLayer;
use crate::sync::scanner::{ReconciliationScanner, ScanConfig};
use crate::sync::watcher::FileWatcher;

const STARTUP_SYNC_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MANUAL_RECONCILE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const SCHEDULED_RECONCILE_PER_REPO_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct SyncManager {
    storage: Arc<dyn StorageLayer>,
    watcher: Arc<FileWatcher>,
    scanner: Arc<ReconciliationScanner>,
    watched: Arc<RwLock<HashMap<RepoID, Repository>>>,
    reconcile_interval: Duration,
    cancel: CancellationToken,
    shutdown_rx: StdMutex<Option<mpsc::Receiver<()>>>,
}

impl SyncManager {
    pub fn new(
        storage: Arc<dyn StorageLayer>,
        watcher: Arc<FileWatcher>,
        scanner: Arc<ReconciliationScanner>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            storage,
            watcher,
            scanner,
            watched: Arc::new(RwLock::new(HashMap::new())),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            cancel: CancellationToken::new(),
            shutdown_rx: StdMutex::new(Some(shutdown_rx)),
        }
    }

    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Bounded startup sync followed by watcher registration.
    pub async fn add_repository(&self, repository: Repository) -> Result<()> {
        let repo_id = repository.id;
        let cancel = CancellationToken::new();

        let outcome = timeout(
            STARTUP_SYNC_TIMEOUT,
            self.scanner.reconcile_repository(
                repo_id,
                &repository.path,
                SyncOperationType::Startup,
                ScanConfig::default(),
                cancel.clone(),
            ),
        )
        .await;

        match outcome {
            Ok(Ok(op)) => info!(
                "startup sync for {} completed: scanned={} added={} updated={} removed={}",
                repository.name, op.files_scanned, op.files_added, op.files_updated, op.files_removed
            ),
            Ok(Err(e)) => warn!("startup sync for {} failed: {e}", repository.name),
            Err(_) => {
                cancel.cancel();
                warn!(
                    "startup sync for {} exceeded {:?}, cancelled",
                    repository.name, STARTUP_SYNC_TIMEOUT
                );
            }
        }

        self.watcher.add_repository(&repository).await?;
        self.watched.write().await.insert(repo_id, repository);
        Ok(())
    }

    pub async fn remove_repository(&self, repository_id: RepoID) {
        self.watcher.remove_repository(repository_id).await;
        self.watched.write().await.remove(&repository_id);
    }

    /// Manual entry point: bounded 30-minute reconcile of one repository.
    pub async fn trigger_reconciliation(&self, repository_id: RepoID) -> Result<()> {
        let repository = self
            .watched
            .read()
            .await
            .get(&repository_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("repository {repository_id} not watched")))?;

        let cancel = CancellationToken::new();
        match timeout(
            MANUAL_RECONCILE_TIMEOUT,
            self.scanner.reconcile_repository(
                repository_id,
                &repository.path,
                SyncOperationType::Reconciliation,
                ScanConfig::default(),
                cancel.clone(),
            ),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                cancel.cancel();
                Err(EngineError::Cancelled(format!(
                    "manual reconciliation of {repository_id} exceeded {:?}",
                    MANUAL_RECONCILE_TIMEOUT
                )))
            }
        }
    }

    /// Runs until the shutdown channel fires: the scheduled-reconciliation
    /// ticker and nothing else — the watcher's own event loop runs inside
    /// `notify_debouncer_full`'s background thread.
    pub async fn run(self: Arc<Self>) {
        info!("starting sync manager");

        let manager = self.clone();
        let reconcile_task = tokio::spawn(async move {
            manager.run_scheduled_reconciliation().await;
        });

        let mut shutdown_rx = self
            .shutdown_rx
            .lock()
            .unwrap()
            .take()
            .expect("SyncManager::run called more than once");
        let _ = shutdown_rx.recv().await;

        info!("shutting down sync manager");
        self.cancel.cancel();
        reconcile_task.abort();
    }

    async fn run_scheduled_reconciliation(&self) {
        let mut ticker = interval(self.reconcile_interval);
        ticker.tick().await; // first tick fires immediately; skip it

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.cancel.cancelled() => return,
            }

            let repositories: Vec<Repository> = self.watched.read().await.values().cloned().collect();
            for repository in repositories {
                let cancel = CancellationToken::new();
                let outcome = timeout(
                    SCHEDULED_RECONCILE_PER_REPO_TIMEOUT,
                    self.scanner.reconcile_repository(
                        repository.id,
                        &repository.path,
                        SyncOperationType::Reconciliation,
                        ScanConfig::default(),
                        cancel.clone(),
                    ),
                )
                .await;

                match outcome {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!("scheduled reconciliation of {} failed: {e}", repository.name),
                    Err(_) => {
                        cancel.cancel();
                        error!(
                            "scheduled reconciliation of {} exceeded {:?}",
                            repository.name, SCHEDULED_RECONCILE_PER_REPO_TIMEOUT
                        );
                    }
                }
            }
        }
    }

    /// Resolves a repository's current absolute path via the storage port,
    /// used when a caller only has an id (mirrors the "resolving each one's
    /// path from the catalog" step of scheduled reconciliation).
    pub async fn resolve_repository(&self, id: RepoID) -> Result<Repository> {
        self.storage.get_repository(id).await
    }
}
