//! Reconciliation scanner: a periodic full walk that brings `file_records`
//! back into agreement with disk, batched, with a generation-based orphan
//! sweep at the end.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use lumilio_model::ids::RepoID;
use lumilio_model::sync::{FileRecord, SyncOperation, SyncOperationStatus, SyncOperationType};
use lumilio_model::Result;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ports::{FileRecordStore, SyncOperationStore};
use crate::sync::watcher::ScanGenerations;

#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    pub batch_size: usize,
    pub calculate_hashes: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            calculate_hashes: true,
        }
    }
}

const IGNORED_EXTENSIONS: &[&str] = &["bak", "swp", "tmp"];

pub struct ReconciliationScanner {
    file_records: Arc<dyn FileRecordStore>,
    sync_operations: Arc<dyn SyncOperationStore>,
    generations: ScanGenerations,
}

impl ReconciliationScanner {
    pub fn new(
        file_records: Arc<dyn FileRecordStore>,
        sync_operations: Arc<dyn SyncOperationStore>,
        generations: ScanGenerations,
    ) -> Self {
        Self {
            file_records,
            sync_operations,
            generations,
        }
    }

    pub async fn reconcile_repository(
        &self,
        repository_id: RepoID,
        repository_path: &Path,
        operation_type: SyncOperationType,
        config: ScanConfig,
        cancel: CancellationToken,
    ) -> Result<SyncOperation> {
        let mut operation = SyncOperation::start(repository_id, operation_type);
        self.sync_operations.start(operation.clone()).await?;

        let scan_generation = self.next_generation(repository_id);
        let started = Instant::now();

        let result = self
            .walk(repository_id, repository_path, config, scan_generation, &cancel)
            .await;

        operation.end_time = Some(Utc::now());
        operation.duration_ms = Some(started.elapsed().as_millis() as i64);

        match result {
            Ok(stats) => {
                operation.status = SyncOperationStatus::Completed;
                operation.files_scanned = stats.files_scanned;
                operation.files_added = stats.files_added;
                operation.files_updated = stats.files_updated;
                operation.files_removed = stats.files_removed;
            }
            Err(e) => {
                operation.status = SyncOperationStatus::Failed;
                operation.error_message = Some(e.to_string());
            }
        }

        self.sync_operations.finish(operation.clone()).await?;
        Ok(operation)
    }

    fn next_generation(&self, repository_id: RepoID) -> i64 {
        let mut generations = self.generations.lock().unwrap();
        let entry = generations.entry(repository_id).or_insert(0);
        *entry += 1;
        *entry
    }

    async fn walk(
        &self,
        repository_id: RepoID,
        repository_path: &Path,
        config: ScanConfig,
        scan_generation: i64,
        cancel: &CancellationToken,
    ) -> Result<WalkStats> {
        let mut stats = WalkStats::default();
        let mut batch = Vec::with_capacity(config.batch_size);
        let mut stack = vec![repository_path.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if cancel.is_cancelled() {
                break;
            }

            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("failed to read directory {}: {e}", dir.display());
                    continue;
                }
            };

            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("failed to read directory entry in {}: {e}", dir.display());
                        break;
                    }
                };
                let path = entry.path();
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };

                if file_type.is_dir() {
                    if !should_skip_dir(&path) {
                        stack.push(path);
                    }
                    continue;
                }

                if should_skip_file(&path) {
                    continue;
                }

                let Some(relative) = relative_path(repository_path, &path) else {
                    continue;
                };
                let Ok(meta) = entry.metadata().await else {
                    continue;
                };

                stats.files_scanned += 1;

                let existing = self.file_records.get(repository_id, &relative).await?;
                let mod_time: chrono::DateTime<Utc> =
                    meta.modified().map(chrono::DateTime::from).unwrap_or_else(|_| Utc::now());

                let needs_update = match &existing {
                    None => true,
                    Some(record) => {
                        record.file_size != meta.len() || record.mod_time != mod_time
                    }
                };

                if needs_update {
                    if existing.is_none() {
                        stats.files_added += 1;
                    } else {
                        stats.files_updated += 1;
                    }
                }

                // Unchanged files still get a record pushed below, with
                // `scan_generation` bumped to this pass's value, or the
                // orphan sweep below would delete them as stale.
                let content_hash = if needs_update && config.calculate_hashes {
                    hash_file(&path).await.ok()
                } else {
                    existing.and_then(|r| r.content_hash)
                };

                batch.push(FileRecord {
                    id: Uuid::new_v4(),
                    repository_id,
                    file_path: relative,
                    file_size: meta.len(),
                    mod_time,
                    content_hash,
                    last_scanned: Utc::now(),
                    scan_generation,
                });

                if batch.len() >= config.batch_size {
                    self.file_records.batch_upsert(std::mem::take(&mut batch)).await?;
                }
            }
        }

        if !batch.is_empty() {
            self.file_records.batch_upsert(batch).await?;
        }

        stats.files_removed = self
            .file_records
            .delete_orphaned(repository_id, scan_generation)
            .await?;

        info!(
            "reconciliation of {} complete: scanned={} added={} updated={} removed={}",
            repository_path.display(),
            stats.files_scanned,
            stats.files_added,
            stats.files_updated,
            stats.files_removed
        );

        Ok(stats)
    }
}

#[derive(Debug, Default)]
struct WalkStats {
    files_scanned: u64,
    files_added: u64,
    files_updated: u64,
    files_removed: u64,
}

fn should_skip_dir(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with('.') || name == "inbox",
        None => false,
    }
}

fn should_skip_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str())
        && (name.starts_with('.') || name.ends_with('~'))
    {
        return true;
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        return IGNORED_EXTENSIONS.contains(&ext);
    }
    false
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

async fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_hidden_and_inbox_directories() {
        assert!(should_skip_dir(Path::new("/repo/.git")));
        assert!(should_skip_dir(Path::new("/repo/inbox")));
        assert!(!should_skip_dir(Path::new("/repo/albums")));
    }

    #[test]
    fn skips_backup_and_swap_files() {
        assert!(should_skip_file(Path::new("/repo/a.jpg.bak")));
        assert!(should_skip_file(Path::new("/repo/.a.jpg.swp")));
        assert!(!should_skip_file(Path::new("/repo/a.jpg")));
    }
}
