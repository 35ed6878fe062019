//! Audio pipeline stages: ffprobe-backed metadata and the smart audio
//! transcode. Waveform generation rides along with transcode as a
//! best-effort side effect — see the module-level note on
//! [`generate_waveform_best_effort`].

use std::path::Path;
use std::sync::Arc;

use lumilio_model::jobs::{MetadataJob, TranscodeJob};
use lumilio_model::kind::{ThumbnailSize, VersionLabel};
use lumilio_model::status::{Task, TaskError};
use lumilio_model::{EngineError, Result};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::ffmpeg;
use crate::metadata::{self, ffprobe};
use crate::ports::{CatalogLayer, StorageLayer};
use crate::status_merge::apply_task_result;

use super::AUDIO_TIMEOUT;

pub async fn process_metadata(catalog: &Arc<dyn CatalogLayer>, job: &MetadataJob) -> Result<()> {
    let errors = metadata_errors(catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::ExtractMetadata, errors).await
}

pub(crate) async fn metadata_errors(
    catalog: &Arc<dyn CatalogLayer>,
    job: &MetadataJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);

    let errors = match timeout(AUDIO_TIMEOUT, metadata::extract_audio(&full_path)).await {
        Ok(Ok(extracted)) => {
            if let Some(duration) = extracted.duration_secs {
                catalog.update_asset_duration(job.asset_id, duration).await?;
            }
            if let Some(specific) = extracted.specific {
                catalog.update_asset_metadata(job.asset_id, specific).await?;
            }
            info!(asset_id = %job.asset_id, "audio metadata extracted");
            Vec::new()
        }
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "audio metadata extraction failed: {e}");
            vec![TaskError { task: Task::ExtractMetadata, error: e.to_string(), fatal: false }]
        }
        Err(_) => vec![TaskError {
            task: Task::ExtractMetadata,
            error: format!("extraction exceeded {:?}", AUDIO_TIMEOUT),
            fatal: false,
        }],
    };

    Ok(errors)
}

pub async fn process_transcode(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &TranscodeJob,
) -> Result<()> {
    let errors = transcode_errors(storage, catalog, job).await?;
    apply_task_result(catalog, job.asset_id, Task::TranscodeAudio, errors).await
}

pub(crate) async fn transcode_errors(
    storage: &Arc<dyn StorageLayer>,
    catalog: &Arc<dyn CatalogLayer>,
    job: &TranscodeJob,
) -> Result<Vec<TaskError>> {
    let full_path = job.repo_path.join(&job.storage_path);
    let outcome = timeout(AUDIO_TIMEOUT, transcode_and_save(storage, catalog, job, &full_path)).await;

    let errors = match outcome {
        Ok(Ok(errors)) => errors,
        Ok(Err(e)) => {
            warn!(asset_id = %job.asset_id, "audio transcode failed: {e}");
            vec![TaskError { task: Task::TranscodeAudio, error: e.to_string(), fatal: false }]
        }
        Err(_) => vec![TaskError {
            task: Task::TranscodeAudio,
            error: format!("transcode exceeded {:?}", AUDIO_TIMEOUT),
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
    let probe = ffprobe::probe_audio(full_path).await?;
    let format = probe.format_name.as_deref().unwrap_or("");
    let bitrate = probe.bitrate_kbps.unwrap_or(0);
    let channels = probe.channels.unwrap_or(2);

    let output_file = tempfile::Builder::new()
        .suffix(".mp3")
        .tempfile()
        .map_err(EngineError::Io)?;
    let output_path = output_file.path().to_path_buf();

    if format.contains("mp3") && (128..=320).contains(&bitrate) {
        ffmpeg::copy_audio(full_path, &output_path).await?;
    } else {
        let target = if bitrate > 0 && bitrate < 192 { "128k" } else { "192k" };
        ffmpeg::transcode_audio(full_path, &output_path, target, channels).await?;
    }

    let asset = catalog.get_asset_by_id(job.asset_id).await?;
    let repository = storage.get_repository(asset.repository_id).await?;

    let mut errors = Vec::new();
    if let Err(e) = storage
        .save_audio_version(&repository, &asset, VersionLabel::Web, &output_path)
        .await
    {
        errors.push(TaskError { task: Task::TranscodeAudio, error: e.to_string(), fatal: false });
    }

    generate_waveform_best_effort(storage, &repository, &asset, full_path).await;

    Ok(errors)
}

/// Waveform generation is not part of the stable task vocabulary's error
/// surface: per the processing design it is "demoted to a silent no-op" on
/// failure, so its outcome never joins `errors` and never blocks the
/// transcode stage's own result. Audio has no separate thumbnail job, so
/// this rides along with transcode, the only queue entry point audio gets.
async fn generate_waveform_best_effort(
    storage: &Arc<dyn StorageLayer>,
    repository: &lumilio_model::Repository,
    asset: &lumilio_model::Asset,
    full_path: &Path,
) {
    let Ok(waveform_file) = tempfile::Builder::new().suffix(".png").tempfile() else {
        return;
    };
    let waveform_path = waveform_file.path().to_path_buf();

    if let Err(e) = ffmpeg::generate_waveform(full_path, &waveform_path).await {
        warn!(asset_id = %asset.id, "waveform generation failed (ignored): {e}");
        return;
    }

    let Ok(bytes) = tokio::fs::read(&waveform_path).await else {
        return;
    };
    if bytes.is_empty() {
        return;
    }

    if let Err(e) = storage
        .save_new_thumbnail(repository, asset, ThumbnailSize::Waveform, bytes)
        .await
    {
        warn!(asset_id = %asset.id, "failed to save waveform thumbnail (ignored): {e}");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn bitrate_copy_threshold_matches_contract() {
        let copy_range = 128..=320;
        assert!(copy_range.contains(&192));
        assert!(!copy_range.contains(&100));
    }
}
