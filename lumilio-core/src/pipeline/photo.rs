//! Photo pipeline stages: EXIF metadata, thumbnail fan-out with RAW preview
//! fallback. ML preprocessing lives in [`crate::pipeline::ml_preprocess`].

use std::path::Path;
use std::sync::Arc;

use lumilio_model::jobs::{MetadataJob, ThumbnailJob};
use lumilio_model::status::{Task, TaskError};
use lumilio_model::{EngineError, Result};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::files;
use crate::imaging;
use crate::metadata;
use crate::ports::{CatalogLayer, StorageLayer};
use crate::raw;
use crate::status_merge::apply_task_result;

use super::{PHOTO_RAW_TIMEOUT, PHOTO_TIMEOUT};

pub async fn process_metadata(catalog: &Arc<dyn CatalogLayer>, job: &MetadataJob) -> Result<()> {
    let errors = metadata_errors(catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::ExtractMetadata, errors).await
}

/// Does the extraction and catalog writes, returning the task-level errors
/// without touching `Asset.status` — shared by [`process_metadata`] and the
/// selective-retry path, which needs to merge several tasks' errors at once.
pub(crate) async fn metadata_errors(
    catalog: &Arc<dyn CatalogLayer>,
    job: &MetadataJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);

    let errors = match timeout(
        PHOTO_TIMEOUT,
        metadata::extract_photo(&full_path, &job.original_filename),
    )
    .await
    {
        Ok(Ok(extracted)) => {
            catalog
                .update_asset_dimensions(job.asset_id, extracted.width, extracted.height)
                .await?;
            if let Some(specific) = extracted.specific {
                catalog.update_asset_metadata(job.asset_id, specific).await?;
            }
            info!(asset_id = %job.asset_id, "photo metadata extracted");
            Vec::new()
        }
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "photo metadata extraction failed: {e}");
            vec![TaskError { task: Task::ExtractMetadata, error: e.to_string(), fatal: false }]
        }
        Err(_) => {
            warn!(asset_id = %job.asset_id, "photo metadata extraction timed out");
            vec![TaskError {
                task: Task::ExtractMetadata,
                error: format!("extraction exceeded {:?}", PHOTO_TIMEOUT),
                fatal: false,
            }]
        }
    };

    Ok(errors)
}

pub async fn process_thumbnails(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &ThumbnailJob,
) -> Result<()> {
    let errors = thumbnail_errors(storage, catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::GenerateThumbnails, errors).await
}

pub(crate) async fn thumbnail_errors(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &ThumbnailJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);
    let is_raw = files::is_raw_file(&job.storage_path);
    let stage_timeout = if is_raw { PHOTO_RAW_TIMEOUT } else { PHOTO_TIMEOUT };

    let outcome = timeout(stage_timeout, generate_and_save(storage, catalog, job, &full_path, is_raw)).await;

    let errors = match outcome {
        Ok(Ok(errors)) => errors,
        Ok(Err(e)) => {
            let fatal = matches!(e, EngineError::Fatal { .. });
            warn!(asset_id = %job.asset_id, "photo thumbnail generation failed: {e}");
            vec![TaskError { task: Task::GenerateThumbnails, error: e.to_string(), fatal }]
        }
        Err(_) => {
            warn!(asset_id = %job.asset_id, "photo thumbnail generation timed out");
            vec![TaskError {
                task: Task::GenerateThumbnails,
                error: format!("thumbnail generation exceeded {:?}", stage_timeout),
                fatal: false,
            }]
        }
    };

    Ok(errors)
}

async fn generate_and_save(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &ThumbnailJob,
    full_path: &Path,
    is_raw: bool,
) -> Result<Vec<TaskError>> {
    let source_bytes = if is_raw {
        match raw::extract_preview(full_path, raw::RawOptions::default()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(asset_id = %job.asset_id, "RAW preview unavailable, falling back to on-disk file: {e}");
                tokio::fs::read(full_path).await?
            }
        }
    } else {
        tokio::fs::read(full_path).await?
    };

    let asset = catalog.get_asset_by_id(job.asset_id).await?;
    let repository = storage.get_repository(asset.repository_id).await?;

    let outputs = tokio::task::spawn_blocking(move || imaging::fan_out_thumbnails(&source_bytes))
        .await
        .map_err(|e| EngineError::Internal(format!("thumbnail resize task panicked: {e}")))?;

    let mut errors = Vec::new();
    for output in outputs {
        match output {
            Ok((size, bytes)) if bytes.is_empty() => {}
            Ok((size, bytes)) => {
                if let Err(e) = storage.save_new_thumbnail(&repository, &asset, size, bytes).await {
                    errors.push(TaskError { task: Task::SaveThumbnails, error: e.to_string(), fatal: false });
                }
            }
            Err(e) => errors.push(TaskError { task: Task::GenerateThumbnails, error: e.to_string(), fatal: false }),
        }
    }

    Ok(errors)
}
