//! Real-time file watcher: one OS watcher per repository, debounced, that
//! mirrors create/write/remove/rename activity into the file-record store.
//! Grounded in the same debounced-watcher shape as other parts of this
//! stack: a `notify_debouncer_full` debouncer per watched root, callbacks
//! that filter noise up front and spawn the actual store write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use lumilio_model::ids::RepoID;
use lumilio_model::sync::FileRecord;
use lumilio_model::{EngineError, Repository, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, NoCache};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::ports::FileRecordStore;

pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(500);

/// Shared scan-generation counter: the reconciliation scanner bumps it per
/// repository, the watcher reads the current value when upserting so
/// real-time writes land on the generation the last full scan established.
pub type ScanGenerations = Arc<StdMutex<HashMap<RepoID, i64>>>;

pub struct FileWatcher {
    store: Arc<dyn FileRecordStore>,
    generations: ScanGenerations,
    debounce_interval: Duration,
    debouncers: AsyncMutex<HashMap<RepoID, Debouncer<RecommendedWatcher, NoCache>>>,
}

impl FileWatcher {
    pub fn new(store: Arc<dyn FileRecordStore>, generations: ScanGenerations) -> Self {
        Self {
            store,
            generations,
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
            debouncers: AsyncMutex::new(HashMap::new()),
        }
    }

    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Registers a watcher rooted at `repository.path`, recursive. Noise
    /// (hidden directories, the `inbox` subtree, editor/backup artifacts) is
    /// dropped at the event-filter stage rather than by selective
    /// subscription, since `notify` does not support skip-listing
    /// subdirectories of a recursive watch.
    pub async fn add_repository(&self, repository: &Repository) -> Result<()> {
        let repo_id = repository.id;
        let repo_path = repository.path.clone();
        let store = self.store.clone();
        let generations = self.generations.clone();

        let mut debouncer = new_debouncer(
            self.debounce_interval,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        handle_event(
                            event.event.clone(),
                            repo_id,
                            repo_path.clone(),
                            store.clone(),
                            generations.clone(),
                        );
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("file watcher error: {e}");
                    }
                }
            },
        )
        .map_err(|e| EngineError::Internal(format!("failed to create debouncer: {e}")))?;

        debouncer
            .watch(&repository.path, RecursiveMode::Recursive)
            .map_err(|e| {
                EngineError::Internal(format!(
                    "failed to watch {}: {e}",
                    repository.path.display()
                ))
            })?;

        self.debouncers.lock().await.insert(repo_id, debouncer);
        Ok(())
    }

    /// Unregisters the watcher for a repository. A no-op if none is
    /// registered.
    pub async fn remove_repository(&self, repository_id: RepoID) {
        self.debouncers.lock().await.remove(&repository_id);
    }
}

fn handle_event(
    event: notify::Event,
    repo_id: RepoID,
    repo_path: PathBuf,
    store: Arc<dyn FileRecordStore>,
    generations: ScanGenerations,
) {
    let Some(path) = event.paths.first().cloned() else {
        return;
    };

    if should_ignore_path(&path) {
        return;
    }

    let Some(relative) = relative_path(&repo_path, &path) else {
        return;
    };

    let is_removal = matches!(event.kind, EventKind::Remove(_));
    let is_rename_away = matches!(event.kind, EventKind::Modify(notify::event::ModifyKind::Name(
        notify::event::RenameMode::From,
    )));

    tokio::spawn(async move {
        if is_removal || is_rename_away {
            if let Err(e) = store.delete(repo_id, &relative).await {
                error!("failed to delete file record for {relative}: {e}");
            }
            return;
        }

        let absolute = repo_path.join(&relative);
        let meta = match tokio::fs::metadata(&absolute).await {
            Ok(meta) => meta,
            Err(_) => {
                debug!("skipping vanished path during watch event: {relative}");
                return;
            }
        };
        if meta.is_dir() {
            return;
        }

        let hash = match hash_file(&absolute).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("failed to hash {relative}: {e}");
                return;
            }
        };

        let scan_generation = *generations.lock().unwrap().get(&repo_id).unwrap_or(&0);

        let record = FileRecord {
            id: Uuid::new_v4(),
            repository_id: repo_id,
            file_path: relative.clone(),
            file_size: meta.len(),
            mod_time: meta
                .modified()
                .map(chrono::DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
            content_hash: Some(hash),
            last_scanned: Utc::now(),
            scan_generation,
        };

        if let Err(e) = store.upsert(record).await {
            error!("failed to upsert file record for {relative}: {e}");
        }
    });
}

async fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

fn should_ignore_path(path: &Path) -> bool {
    if path_contains_ignored_dir(path) {
        return true;
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name.starts_with('.')
                || name.ends_with('~')
                || name.ends_with(".tmp")
                || name == "Thumbs.db"
        }
        None => false,
    }
}

fn path_contains_ignored_dir(path: &Path) -> bool {
    path.components().any(|c| match c {
        std::path::Component::Normal(os) => match os.to_str() {
            Some(s) => s == "inbox" || (s.starts_with('.') && s != "."),
            None => false,
        },
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_hidden_and_inbox_paths() {
        assert!(should_ignore_path(Path::new("/repo/.git/HEAD")));
        assert!(should_ignore_path(Path::new("/repo/inbox/2026/a.jpg")));
        assert!(should_ignore_path(Path::new("/repo/albums/.DS_Store")));
        assert!(should_ignore_path(Path::new("/repo/albums/file.tmp")));
        assert!(!should_ignore_path(Path::new("/repo/albums/2026/a.jpg")));
    }

    #[test]
    fn relative_path_strips_root() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/albums/a.jpg")),
            Some("albums/a.jpg".to_string())
        );
    }
}
