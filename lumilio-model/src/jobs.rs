use serde::{Deserialize, Serialize};

use crate::ids::AssetID;
use crate::kind::AssetKind;

/// The only routing key between the job dispatcher and the queue runtime.
pub const QUEUE_METADATA: &str = "metadata_asset";
pub const QUEUE_THUMBNAIL: &str = "thumbnail_asset";
pub const QUEUE_TRANSCODE: &str = "transcode_asset";
pub const QUEUE_PROCESS_CLIP: &str = "process_clip";
pub const QUEUE_PROCESS_OCR: &str = "process_ocr";
pub const QUEUE_PROCESS_CAPTION: &str = "process_caption";
pub const QUEUE_PROCESS_FACE: &str = "process_face";
pub const QUEUE_RETRY_ASSET: &str = "retry_asset";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub client_hash: String,
    pub staged_path: std::path::PathBuf,
    pub user_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub content_type: String,
    pub file_name: String,
    #[serde(default)]
    pub repository_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataJob {
    pub asset_id: AssetID,
    pub repo_path: std::path::PathBuf,
    pub storage_path: String,
    pub asset_type: AssetKind,
    pub original_filename: String,
    pub file_size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub asset_id: AssetID,
    pub repo_path: std::path::PathBuf,
    pub storage_path: String,
    pub asset_type: AssetKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub asset_id: AssetID,
    pub repo_path: std::path::PathBuf,
    pub storage_path: String,
    pub asset_type: AssetKind,
}

/// Shared shape for the four ML preprocess-output jobs. They differ only in
/// the queue they are posted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessedImageJob {
    pub asset_id: AssetID,
    pub image_data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAssetJob {
    pub asset_id: String,
    #[serde(default)]
    pub retry_tasks: Option<Vec<String>>,
    #[serde(default)]
    pub force_full_retry: bool,
}

impl RetryAssetJob {
    /// Dedup key for the queue: retries for the same asset replace each other.
    pub fn dedup_key(&self) -> &str {
        &self.asset_id
    }
}
