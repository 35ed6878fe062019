//! Shared data model for the Lumilio ingestion engine: asset/repository
//! records, the closed task-name vocabulary, queue job payloads, and the
//! crate-wide error type. Kept dependency-light so adapters and the core
//! engine can both compile against it without pulling in I/O concerns.

pub mod asset;
pub mod error;
pub mod flags;
pub mod ids;
pub mod jobs;
pub mod kind;
pub mod metadata;
pub mod status;
pub mod sync;

pub use asset::{Asset, Repository};
pub use error::{EngineError, Result};
pub use flags::FeatureFlags;
pub use ids::{AssetID, OwnerID, RepoID};
pub use kind::{AssetKind, ThumbnailSize, VersionLabel};
pub use metadata::{AudioMeta, PhotoMeta, SpecificMetadata, VideoMeta};
pub use status::{AssetStatus, Phase, Task, TaskError};
pub use sync::{FileRecord, SyncOperation, SyncOperationStatus, SyncOperationType};
