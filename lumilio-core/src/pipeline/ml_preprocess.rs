//! Photo ML preprocessing and enqueue: four independent resize+enqueue
//! substeps, one per feature-flagged job, run by the fault-tolerant task
//! group so a failure in one never blocks the others.

use std::sync::Arc;

use lumilio_model::ids::AssetID;
use lumilio_model::jobs::{
    PreprocessedImageJob, QUEUE_PROCESS_CAPTION, QUEUE_PROCESS_CLIP, QUEUE_PROCESS_FACE,
    QUEUE_PROCESS_OCR,
};
use lumilio_model::{EngineError, FeatureFlags};
use tracing::warn;

use crate::concurrency::{run_all, Task as GroupTask};
use crate::imaging::{self, ResizeOptions};
use crate::ports::{enqueue_job, JobProducer};

/// Resolves the resize+enqueue substeps named by the enabled flags and runs
/// them concurrently. Never fails the caller: substep failures are logged
/// and dropped, matching "a failure of any single preprocess step is
/// surfaced as a job-local error; other enabled jobs still enqueue".
pub async fn run(
    queue: &Arc<dyn JobProducer>,
    flags: FeatureFlags,
    asset_id: AssetID,
    source_bytes: Arc<Vec<u8>>,
) {
    if !flags.any_enabled() {
        return;
    }

    let mut tasks: Vec<GroupTask> = Vec::new();
    if flags.clip_enabled {
        tasks.push(preprocess_task(
            queue.clone(),
            source_bytes.clone(),
            asset_id,
            imaging::clip_options(),
            QUEUE_PROCESS_CLIP,
        ));
    }
    if flags.ocr_enabled {
        tasks.push(preprocess_task(
            queue.clone(),
            source_bytes.clone(),
            asset_id,
            imaging::ocr_options(),
            QUEUE_PROCESS_OCR,
        ));
    }
    if flags.caption_enabled {
        tasks.push(preprocess_task(
            queue.clone(),
            source_bytes.clone(),
            asset_id,
            imaging::caption_options(),
            QUEUE_PROCESS_CAPTION,
        ));
    }
    if flags.face_enabled {
        tasks.push(preprocess_task(
            queue.clone(),
            source_bytes.clone(),
            asset_id,
            imaging::face_options(),
            QUEUE_PROCESS_FACE,
        ));
    }

    for error in run_all(tasks).await {
        warn!(asset_id = %asset_id, "ML preprocessing substep failed (ignored): {error}");
    }
}

fn preprocess_task(
    queue: Arc<dyn JobProducer>,
    source_bytes: Arc<Vec<u8>>,
    asset_id: AssetID,
    options: ResizeOptions,
    queue_name: &'static str,
) -> GroupTask {
    Box::pin(async move {
        let image_data =
            tokio::task::spawn_blocking(move || imaging::resize_single(&source_bytes, options))
                .await
                .map_err(|e| EngineError::Internal(format!("preprocess resize task panicked: {e}")))??;

        let job = PreprocessedImageJob { asset_id, image_data };
        enqueue_job(queue.as_ref(), queue_name, &job).await
    })
}
