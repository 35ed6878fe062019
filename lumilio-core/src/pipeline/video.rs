//! Video pipeline stages: ffprobe-backed metadata, representative-frame
//! thumbnails, and the smart video transcode.

use std::path::Path;
use std::sync::Arc;

use lumilio_model::jobs::{MetadataJob, ThumbnailJob, TranscodeJob};
use lumilio_model::kind::VersionLabel;
use lumilio_model::status::{Task, TaskError};
use lumilio_model::{EngineError, Result};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::ffmpeg;
use crate::imaging;
use crate::metadata::{self, ffprobe};
use crate::ports::{CatalogLayer, StorageLayer};
use crate::status_merge::apply_task_result;

use super::VIDEO_TIMEOUT;

pub async fn process_metadata(catalog: &Arc<dyn CatalogLayer>, job: &MetadataJob) -> Result<()> {
    let errors = metadata_errors(catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::ExtractMetadata, errors).await
}

pub(crate) async fn metadata_errors(
    catalog: &Arc<dyn CatalogLayer>,
    job: &MetadataJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);

    let errors = match timeout(VIDEO_TIMEOUT, metadata::extract_video(&full_path)).await {
        Ok(Ok(extracted)) => {
            catalog
                .update_asset_dimensions(job.asset_id, extracted.width, extracted.height)
                .await?;
            if let Some(duration) = extracted.duration_secs {
                catalog.update_asset_duration(job.asset_id, duration).await?;
            }
            if let Some(specific) = extracted.specific {
                catalog.update_asset_metadata(job.asset_id, specific).await?;
            }
            info!(asset_id = %job.asset_id, "video metadata extracted");
            Vec::new()
        }
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "video metadata extraction failed: {e}");
            vec![TaskError { task: Task::ExtractMetadata, error: e.to_string(), fatal: false }]
        }
        Err(_) => vec![TaskError {
            task: Task::ExtractMetadata,
            error: format!("extraction exceeded {:?}", VIDEO_TIMEOUT),
            fatal: false,
        }],
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
    let outcome = timeout(VIDEO_TIMEOUT, generate_and_save(storage, catalog, job, &full_path)).await;

    let errors = match outcome {
        Ok(Ok(errors)) => errors,
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "video thumbnail generation failed: {e}");
            vec![TaskError { task: Task::GenerateThumbnails, error: e.to_string(), fatal: false }]
        }
        Err(_) => vec![TaskError {
            task: Task::GenerateThumbnails,
            error: format!("thumbnail generation exceeded {:?}", VIDEO_TIMEOUT),
            fatal: false,
        }],
    };

    Ok(errors)
}

async fn generate_and_save(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &ThumbnailJob,
    full_path: &Path,
) -> Result<Vec<TaskError>> {
    let probe = ffprobe::probe_video(full_path).await?;
    let timestamp = representative_timestamp(probe.duration_secs);

    let frame_file = tempfile::Builder::new()
        .suffix(".jpg")
        .tempfile()
        .map_err(EngineError::Io)?;
    let frame_path = frame_file.path().to_path_buf();
    ffmpeg::extract_frame(full_path, timestamp, &frame_path).await?;
    let frame_bytes = tokio::fs::read(&frame_path).await?;

    let asset = catalog.get_asset_by_id(job.asset_id).await?;
    let repository = storage.get_repository(asset.repository_id).await?;

    let outputs = tokio::task::spawn_blocking(move || imaging::fan_out_thumbnails(&frame_bytes))
        .await
        .map_err(|e| EngineError::Internal(format!("thumbnail resize task panicked: {e}")))?;

    let mut errors = Vec::new();
    for output in outputs {
        match output {
            Ok((_, bytes)) if bytes.is_empty() => {}
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

/// `00:00:01` by default; for very short clips (0, 10) seconds, 10% in.
fn representative_timestamp(duration_secs: Option<f64>) -> u64 {
    match duration_secs {
        Some(d) if d > 0.0 && d < 10.0 => (d * 0.1).floor() as u64,
        _ => 1,
    }
}

pub async fn process_transcode(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &TranscodeJob,
) -> Result<()> {
    let errors = transcode_errors(storage, catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::TranscodeVideo, errors).await
}

pub(crate) async fn transcode_errors(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &TranscodeJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);
    let outcome = timeout(VIDEO_TIMEOUT, transcode_and_save(storage, catalog, job, &full_path)).await;

    let errors = match outcome {
        Ok(Ok(errors)) => errors,
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "video transcode failed: {e}");
            vec![TaskError { task: Task::TranscodeVideo, error: e.to_string(), fatal: false }]
        }
        Err(_) => vec![TaskError {
            task: Task::TranscodeVideo,
            error: format!("transcode exceeded {:?}", VIDEO_TIMEOUT),
            fatal: false,
        }],
    };

    Ok(errors)
}

async fn transcode_and_save(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &TranscodeJob,
    full_path: &Path,
) -> Result<Vec<TaskError>> {
    let probe = ffprobe::probe_video(full_path).await?;
    let height = probe.height.unwrap_or(0);
    let width = probe.width.unwrap_or(0);
    let format = probe.format_name.as_deref().unwrap_or("");
    let codec = probe.codec.as_deref().unwrap_or("");

    let output_file = tempfile::Builder::new()
        .suffix(".mp4")
        .tempfile()
        .map_err(EngineError::Io)?;
    let output_path = output_file.path().to_path_buf();

    if height <= 1080 && format.contains("mp4") && codec.contains("h264") {
        ffmpeg::copy_video(full_path, &output_path).await?;
    } else if height <= 1080 {
        ffmpeg::transcode_video(full_path, &output_path, width, height).await?;
    } else {
        let new_width = round_down_to_even((1080.0 * width as f64 / height.max(1) as f64) as u32);
        ffmpeg::transcode_video(full_path, &output_path, new_width, 1080).await?;
    }

    let asset = catalog.get_asset_by_id(job.asset_id).await?;
    let repository = storage.get_repository(asset.repository_id).await?;

    let mut errors = Vec::new();
    if let Err(e) = storage
        .save_video_version(&repository, &asset, VersionLabel::Web, &output_path)
        .await
    {
        errors.push(TaskError { task: Task::TranscodeVideo, error: e.to_string(), fatal: false });
    }
    Ok(errors)
}

fn round_down_to_even(value: u32) -> u32 {
    value - (value % 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representative_timestamp_defaults_to_one_second() {
        assert_eq!(representative_timestamp(Some(120.0)), 1);
        assert_eq!(representative_timestamp(None), 1);
    }

    #[test]
    fn representative_timestamp_scales_short_clips() {
        assert_eq!(representative_timestamp(Some(5.0)), 0);
        assert_eq!(representative_timestamp(Some(9.9)), 0);
    }

    #[test]
    fn rounds_odd_widths_down() {
        assert_eq!(round_down_to_even(1921), 1920);
        assert_eq!(round_down_to_even(1920), 1920);
    }
}
