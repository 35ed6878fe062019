//! ML preprocess-output job consumers. Only CLIP has a storage contract
//! (`SaveNewEmbedding`); OCR/caption/face are best-effort and log-only —
//! see `DESIGN.md` for why.

use std::sync::Arc;

use lumilio_model::jobs::PreprocessedImageJob;
use lumilio_model::status::{Task, TaskError};
use lumilio_model::Result;
use tracing::{info, warn};

use crate::ml::MlClient;
use crate::ports::{CatalogLayer, Embedding};
use crate::status_merge::apply_task_result;

const CLIP_MODEL: &str = "clip-vit-b32";

/// Consumer of `process_clip`. A nil/empty vector is the fatal condition
/// named by the processing design; it marks `clip_processing` fatal rather
/// than retryable.
pub async fn process_clip(
    catalog: &Arc<dyn CatalogLayer>,
    ml_client: &Arc<MlClient>,
    job: &PreprocessedImageJob,
) -> Result<()> {
    let errors = clip_errors(catalog, ml_client, job).await?;
    apply_task_result(catalog, job.asset_id, Task::ClipProcessing, errors).await
}

pub(crate) async fn clip_errors(
    catalog: &Arc<dyn CatalogLayer>,
    ml_client: &Arc<MlClient>,
    job: &PreprocessedImageJob,
) -> Result<Vec<TaskError>> {
    let errors = match ml_client.process_image_for_clip(&job.image_data).await {
        Ok(vector) => {
            catalog
                .save_new_embedding(Embedding { asset_id: job.asset_id, model: CLIP_MODEL.into(), vector })
                .await?;
            info!(asset_id = %job.asset_id, "CLIP embedding saved");
            Vec::new()
        }
        Err(e) => {
            warn!(asset_id = %job.asset_id, "CLIP processing failed: {e}");
            vec![TaskError { task: Task::ClipProcessing, error: e.to_string(), fatal: true }]
        }
    };

    Ok(errors)
}

pub async fn process_ocr(ml_client: &Arc<MlClient>, job: &PreprocessedImageJob) {
    match ml_client.process_image_for_ocr(&job.image_data).await {
        Ok(text) => info!(asset_id = %job.asset_id, "OCR extracted {} characters", text.len()),
        Err(e) => warn!(asset_id = %job.asset_id, "OCR processing failed (ignored): {e}"),
    }
}

pub async fn process_caption(ml_client: &Arc<MlClient>, job: &PreprocessedImageJob) {
    match ml_client.process_image_for_caption(&job.image_data).await {
        Ok(caption) => info!(asset_id = %job.asset_id, "caption generated: {caption}"),
        Err(e) => warn!(asset_id = %job.asset_id, "caption processing failed (ignored): {e}"),
    }
}

pub async fn process_face(ml_client: &Arc<MlClient>, job: &PreprocessedImageJob) {
    match ml_client.process_image_for_face(&job.image_data).await {
        Ok(regions) => info!(asset_id = %job.asset_id, "face detection found {} region(s)", regions.len()),
        Err(e) => warn!(asset_id = %job.asset_id, "face processing failed (ignored): {e}"),
    }
}
