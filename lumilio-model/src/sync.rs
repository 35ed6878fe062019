use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::RepoID;

/// Advisory record of one file discovered under a repository's user-managed
/// area. `(repository_id, file_path)` is the unique key; this table never
/// gates asset existence, it only mirrors what sync observed on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub repository_id: RepoID,
    pub file_path: String,
    pub file_size: u64,
    pub mod_time: DateTime<Utc>,
    pub content_hash: Option<String>,
    pub last_scanned: DateTime<Utc>,
    pub scan_generation: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperationType {
    Realtime,
    Reconciliation,
    Startup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperationStatus {
    Running,
    Completed,
    Failed,
}

/// Audit row for one scan/reconcile/startup run. Inserted *running*,
/// updated exactly once at terminal state, never mutated thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOperation {
    pub id: Uuid,
    pub repository_id: RepoID,
    pub operation_type: SyncOperationType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub status: SyncOperationStatus,
    pub files_scanned: u64,
    pub files_added: u64,
    pub files_updated: u64,
    pub files_removed: u64,
    pub error_message: Option<String>,
}

impl SyncOperation {
    pub fn start(repository_id: RepoID, operation_type: SyncOperationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            repository_id,
            operation_type,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            status: SyncOperationStatus::Running,
            files_scanned: 0,
            files_added: 0,
            files_updated: 0,
            files_removed: 0,
            error_message: None,
        }
    }
}
