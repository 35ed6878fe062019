//! File-record store port: a thin typed wrapper the sync subsystem uses to
//! mirror on-disk state. Strictly advisory — it never gates asset existence.

use async_trait::async_trait;
use lumilio_model::ids::RepoID;
use lumilio_model::sync::FileRecord;
use lumilio_model::Result;

#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn create(&self, record: FileRecord) -> Result<()>;

    async fn update(&self, record: FileRecord) -> Result<()>;

    /// Idempotent on `(repository_id, file_path)`: a second call with a new
    /// value for the same key replaces the first, matching
    /// `Upsert(k, v1); Upsert(k, v2) ≡ Upsert(k, v2)`.
    async fn upsert(&self, record: FileRecord) -> Result<()>;

    async fn get(&self, repository_id: RepoID, file_path: &str) -> Result<Option<FileRecord>>;

    /// Alphabetical by `file_path`.
    async fn list(&self, repository_id: RepoID) -> Result<Vec<FileRecord>>;

    async fn delete(&self, repository_id: RepoID, file_path: &str) -> Result<()>;

    /// Deletes every record for `repository_id` whose `scan_generation` is
    /// strictly less than `scan_generation`; returns the count removed.
    async fn delete_orphaned(&self, repository_id: RepoID, scan_generation: i64) -> Result<u64>;

    async fn count(&self, repository_id: RepoID) -> Result<u64>;

    async fn batch_upsert(&self, records: Vec<FileRecord>) -> Result<()>;

    async fn get_by_hash(&self, repository_id: RepoID, hash: &str) -> Result<Vec<FileRecord>>;
}
