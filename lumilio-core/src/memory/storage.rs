//! In-memory [`StorageLayer`]: writes artifacts under each repository's own
//! `path` on the local filesystem rather than a real object store, so tests
//! can assert on bytes without a mock collaborator.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use lumilio_model::ids::RepoID;
use lumilio_model::kind::{ThumbnailSize, VersionLabel};
use lumilio_model::{Asset, EngineError, Repository, Result};
use tokio::sync::Mutex;

use crate::ports::StorageLayer;

#[derive(Default)]
pub struct MemoryStorage {
    repositories: Mutex<HashMap<RepoID, Repository>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_repository(&self, repository: Repository) {
        self.repositories.lock().await.insert(repository.id, repository);
    }
}

#[async_trait]
impl StorageLayer for MemoryStorage {
    async fn commit_staged_file(
        &self,
        staged_path: &Path,
        file_name: &str,
        hash: &str,
        repository: &Repository,
    ) -> Result<String> {
        let storage_path = format!(".lumilio/inbox/{hash}_{file_name}");
        let dest = repository.path.join(&storage_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(EngineError::Io)?;
        }
        tokio::fs::copy(staged_path, &dest).await.map_err(EngineError::Io)?;
        Ok(storage_path)
    }

    async fn save_new_thumbnail(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: ThumbnailSize,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let ext = if label == ThumbnailSize::Waveform { "png" } else { "jpg" };
        let storage_path = format!(".lumilio/thumbnails/{}_{}.{ext}", asset.id, label.label());
        let dest = repository.path.join(&storage_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(EngineError::Io)?;
        }
        tokio::fs::write(&dest, bytes).await.map_err(EngineError::Io)?;
        Ok(storage_path)
    }

    async fn save_video_version(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: VersionLabel,
        source: &Path,
    ) -> Result<String> {
        let storage_path = format!(".lumilio/versions/{}_{}.mp4", asset.id, label.label());
        let dest = repository.path.join(&storage_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(EngineError::Io)?;
        }
        tokio::fs::copy(source, &dest).await.map_err(EngineError::Io)?;
        Ok(storage_path)
    }

    async fn save_audio_version(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: VersionLabel,
        source: &Path,
    ) -> Result<String> {
        let storage_path = format!(".lumilio/versions/{}_{}.mp3", asset.id, label.label());
        let dest = repository.path.join(&storage_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(EngineError::Io)?;
        }
        tokio::fs::copy(source, &dest).await.map_err(EngineError::Io)?;
        Ok(storage_path)
    }

    async fn get_repository(&self, id: RepoID) -> Result<Repository> {
        self.repositories
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("repository {id} not found")))
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        Ok(self.repositories.lock().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumilio_model::kind::AssetKind;
    use lumilio_model::status::AssetStatus;
    use tempfile::tempdir;

    fn sample_asset(repository_id: RepoID) -> Asset {
        Asset {
            id: lumilio_model::ids::AssetID::new(),
            repository_id,
            owner_id: None,
            kind: AssetKind::Photo,
            mime_type: "image/jpeg".into(),
            hash: "abc".into(),
            file_size: 10,
            original_filename: "x.jpg".into(),
            upload_time: chrono::Utc::now(),
            taken_time: None,
            width: None,
            height: None,
            duration_secs: None,
            specific_metadata: None,
            storage_path: None,
            status: AssetStatus::processing("x"),
        }
    }

    #[tokio::test]
    async fn commit_staged_file_copies_into_repository_path() {
        let root = tempdir().unwrap();
        let repo_dir = root.path().join("repo");
        tokio::fs::create_dir_all(&repo_dir).await.unwrap();
        let repository = Repository { id: RepoID::new(), path: repo_dir.clone(), name: "main".into() };

        let staged = root.path().join("staged.jpg");
        tokio::fs::write(&staged, b"hello").await.unwrap();

        let storage = MemoryStorage::new();
        let storage_path = storage
            .commit_staged_file(&staged, "staged.jpg", "abc123", &repository)
            .await
            .unwrap();

        let committed = tokio::fs::read(repo_dir.join(&storage_path)).await.unwrap();
        assert_eq!(committed, b"hello");
    }

    #[tokio::test]
    async fn unregistered_repository_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.get_repository(RepoID::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
