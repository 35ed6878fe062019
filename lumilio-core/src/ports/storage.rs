//! Storage-layer port: staging, inbox commit, and artifact write primitives.
//! A concrete object-storage/filesystem adapter is an external collaborator;
//! the in-memory adapter under [`crate::memory`] is the only implementation
//! this crate ships.

use std::path::Path;

use async_trait::async_trait;
use lumilio_model::ids::RepoID;
use lumilio_model::kind::{ThumbnailSize, VersionLabel};
use lumilio_model::{Asset, Repository, Result};

#[async_trait]
pub trait StorageLayer: Send + Sync {
    /// Moves a staged file into the repository's inbox, returning the
    /// repository-relative path it was committed to.
    async fn commit_staged_file(
        &self,
        staged_path: &Path,
        file_name: &str,
        hash: &str,
        repository: &Repository,
    ) -> Result<String>;

    /// Writes one resized thumbnail buffer; empty buffers should not be
    /// passed in, callers skip them before calling.
    async fn save_new_thumbnail(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: ThumbnailSize,
        bytes: Vec<u8>,
    ) -> Result<String>;

    /// Saves a transcoded video version by streaming from a local source
    /// file (the encoder's output) into repository storage.
    async fn save_video_version(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: VersionLabel,
        source: &Path,
    ) -> Result<String>;

    /// Saves a transcoded audio version, analogous to
    /// [`StorageLayer::save_video_version`].
    async fn save_audio_version(
        &self,
        repository: &Repository,
        asset: &Asset,
        label: VersionLabel,
        source: &Path,
    ) -> Result<String>;

    async fn get_repository(&self, id: RepoID) -> Result<Repository>;

    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// Resolves a repository-relative storage path to an absolute path
    /// rooted at the repository.
    fn resolve(&self, repository: &Repository, storage_path: &str) -> std::path::PathBuf {
        repository.path.join(storage_path)
    }
}
