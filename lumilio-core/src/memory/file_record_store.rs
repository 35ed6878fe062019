//! In-memory [`FileRecordStore`]: keyed by `(repository_id, file_path)`,
//! matching the advisory semantics the port documents.

use std::collections::HashMap;

use async_trait::async_trait;
use lumilio_model::ids::RepoID;
use lumilio_model::sync::FileRecord;
use lumilio_model::Result;
use tokio::sync::Mutex;

use crate::ports::FileRecordStore;

#[derive(Default)]
pub struct MemoryFileRecordStore {
    records: Mutex<HashMap<(RepoID, String), FileRecord>>,
}

impl MemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileRecordStore for MemoryFileRecordStore {
    async fn create(&self, record: FileRecord) -> Result<()> {
        self.records
            .lock()
            .await
            .insert((record.repository_id, record.file_path.clone()), record);
        Ok(())
    }

    async fn update(&self, record: FileRecord) -> Result<()> {
        self.create(record).await
    }

    async fn upsert(&self, record: FileRecord) -> Result<()> {
        self.create(record).await
    }

    async fn get(&self, repository_id: RepoID, file_path: &str) -> Result<Option<FileRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .get(&(repository_id, file_path.to_string()))
            .cloned())
    }

    async fn list(&self, repository_id: RepoID) -> Result<Vec<FileRecord>> {
        let mut records: Vec<FileRecord> = self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.repository_id == repository_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(records)
    }

    async fn delete(&self, repository_id: RepoID, file_path: &str) -> Result<()> {
        self.records.lock().await.remove(&(repository_id, file_path.to_string()));
        Ok(())
    }

    async fn delete_orphaned(&self, repository_id: RepoID, scan_generation: i64) -> Result<u64> {
        let mut records = self.records.lock().await;
        let stale: Vec<(RepoID, String)> = records
            .iter()
            .filter(|(_, r)| r.repository_id == repository_id && r.scan_generation < scan_generation)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            records.remove(key);
        }
        Ok(stale.len() as u64)
    }

    async fn count(&self, repository_id: RepoID) -> Result<u64> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.repository_id == repository_id)
            .count() as u64)
    }

    async fn batch_upsert(&self, records: Vec<FileRecord>) -> Result<()> {
        let mut guard = self.records.lock().await;
        for record in records {
            guard.insert((record.repository_id, record.file_path.clone()), record);
        }
        Ok(())
    }

    async fn get_by_hash(&self, repository_id: RepoID, hash: &str) -> Result<Vec<FileRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.repository_id == repository_id && r.content_hash.as_deref() == Some(hash))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(repository_id: RepoID, file_path: &str, scan_generation: i64) -> FileRecord {
        FileRecord {
            id: uuid::Uuid::new_v4(),
            repository_id,
            file_path: file_path.into(),
            file_size: 100,
            mod_time: Utc::now(),
            content_hash: Some("hash".into()),
            last_scanned: Utc::now(),
            scan_generation,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_entry_for_same_key() {
        let store = MemoryFileRecordStore::new();
        let repo = RepoID::new();
        store.upsert(record(repo, "a.jpg", 1)).await.unwrap();
        store.upsert(record(repo, "a.jpg", 2)).await.unwrap();

        let fetched = store.get(repo, "a.jpg").await.unwrap().unwrap();
        assert_eq!(fetched.scan_generation, 2);
        assert_eq!(store.count(repo).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_orphaned_removes_only_stale_generations() {
        let store = MemoryFileRecordStore::new();
        let repo = RepoID::new();
        store.upsert(record(repo, "old.jpg", 1)).await.unwrap();
        store.upsert(record(repo, "new.jpg", 3)).await.unwrap();

        let removed = store.delete_orphaned(repo, 2).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(repo, "old.jpg").await.unwrap().is_none());
        assert!(store.get(repo, "new.jpg").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_is_alphabetical_by_file_path() {
        let store = MemoryFileRecordStore::new();
        let repo = RepoID::new();
        store.upsert(record(repo, "b.jpg", 1)).await.unwrap();
        store.upsert(record(repo, "a.jpg", 1)).await.unwrap();

        let listed = store.list(repo).await.unwrap();
        assert_eq!(listed.iter().map(|r| r.file_path.as_str()).collect::<Vec<_>>(), vec!["a.jpg", "b.jpg"]);
    }
}
