use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AssetID, OwnerID, RepoID};
use crate::kind::AssetKind;
use crate::metadata::SpecificMetadata;
use crate::status::AssetStatus;

/// One media file tracked in the catalog, plus all derived artifacts keyed
/// by its id. `storage_path` is `None` until the staged file has been
/// committed into the repository's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetID,
    pub repository_id: RepoID,
    pub owner_id: Option<OwnerID>,
    pub kind: AssetKind,
    pub mime_type: String,
    pub hash: String,
    pub file_size: u64,
    pub original_filename: String,
    pub upload_time: DateTime<Utc>,
    pub taken_time: Option<DateTime<Utc>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub specific_metadata: Option<SpecificMetadata>,
    pub storage_path: Option<String>,
    pub status: AssetStatus,
}

/// A rooted directory managed by the system; user-managed files live under
/// it and may be edited externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoID,
    pub path: std::path::PathBuf,
    pub name: String,
}
