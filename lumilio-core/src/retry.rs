//! Selective retry: re-runs a chosen subset of an asset's failed pipeline
//! stages as a fault-tolerant task group and atomically merges the result
//! into `Asset.status` with a single catalog write.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use lumilio_model::ids::AssetID;
use lumilio_model::jobs::{MetadataJob, PreprocessedImageJob, RetryAssetJob, ThumbnailJob, TranscodeJob};
use lumilio_model::kind::AssetKind;
use lumilio_model::status::{AssetStatus, Task, TaskError};
use lumilio_model::{Asset, EngineError, Repository, Result};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::context::EngineContext;
use crate::files;
use crate::imaging;
use crate::ml::MlClient;
use crate::pipeline::{audio, clip, photo, video};
use crate::ports::{CatalogLayer, StorageLayer};
use crate::raw;
use crate::status_merge::merge_retry;

type RetryOutcome = (Task, Result<Vec<TaskError>>);
type RetryTask = BoxFuture<'static, RetryOutcome>;

pub async fn retry(ctx: &EngineContext, job: &RetryAssetJob) -> Result<()> {
    let asset_id = AssetID::from_str(&job.asset_id)
        .map_err(|_| EngineError::Validation(format!("invalid asset id: {}", job.asset_id)))?;

    let asset = ctx.catalog.get_asset_by_id(asset_id).await?;

    if !asset.status.is_retryable() {
        return fail_precondition(ctx, asset_id, "asset status is not retryable").await;
    }
    if asset.status.has_fatal_errors() {
        return fail_precondition(ctx, asset_id, "asset has fatal errors and cannot be retried").await;
    }
    let storage_path = match asset.storage_path.clone() {
        Some(path) => path,
        None => return fail_precondition(ctx, asset_id, "asset has no committed storage path").await,
    };

    let repository = ctx.storage.get_repository(asset.repository_id).await?;
    let full_path = repository.path.join(&storage_path);
    if tokio::fs::metadata(&full_path).await.is_err() {
        return fail_precondition(ctx, asset_id, "asset file missing from repository").await;
    }

    let tasks_to_retry = select_tasks(job, &asset);
    if tasks_to_retry.is_empty() {
        info!(asset_id = %asset_id, "selective retry named nothing retryable, no-op");
        return Ok(());
    }

    let retry_tasks = build_retry_tasks(ctx, &asset, &repository, &storage_path, &tasks_to_retry);

    let mut set = JoinSet::new();
    for task in retry_tasks {
        set.spawn(task);
    }

    let mut new_errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(errors))) => new_errors.extend(errors),
            Ok((task, Err(e))) => {
                warn!(asset_id = %asset_id, %task, "retry helper failed: {e}");
                new_errors.push(TaskError { task, error: e.to_string(), fatal: false });
            }
            Err(join_err) => {
                warn!(asset_id = %asset_id, "retry helper panicked: {join_err}");
                new_errors.push(TaskError {
                    task: Task::SelectiveRetry,
                    error: format!("retry helper panicked: {join_err}"),
                    fatal: false,
                });
            }
        }
    }

    let merged = merge_retry(&asset.status, &tasks_to_retry, new_errors);
    ctx.catalog.update_asset_status(asset_id, merged).await
}

/// Writes a single-error failed status before returning the precondition
/// error, so a retry that fails outright still leaves a visible trail
/// instead of silently no-oping from the caller's perspective.
async fn fail_precondition(ctx: &EngineContext, asset_id: AssetID, message: &str) -> Result<()> {
    let status = AssetStatus::failed(
        message,
        vec![TaskError { task: Task::SelectiveRetry, error: message.into(), fatal: true }],
    );
    ctx.catalog.update_asset_status(asset_id, status).await?;
    Err(EngineError::Precondition(message.into()))
}

/// `force_full_retry`, or an absent/empty task list, replays every task
/// currently recorded as failed. Otherwise the caller names tasks
/// explicitly; names outside the closed vocabulary are dropped rather than
/// rejected.
fn select_tasks(job: &RetryAssetJob, asset: &Asset) -> Vec<Task> {
    let wants_everything = job.force_full_retry
        || job.retry_tasks.as_ref().map(|t| t.is_empty()).unwrap_or(true);

    if wants_everything {
        asset.status.get_failed_tasks()
    } else {
        job.retry_tasks
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|name| Task::parse(name))
            .collect()
    }
}

fn build_retry_tasks(
    ctx: &EngineContext,
    asset: &Asset,
    repository: &Repository,
    storage_path: &str,
    tasks: &[Task],
) -> Vec<RetryTask> {
    tasks
        .iter()
        .map(|&task| {
            let catalog = ctx.catalog.clone();
            let storage = ctx.storage.clone();
            let ml_client = ctx.ml_client.clone();
            let repository = repository.clone();
            let asset_id = asset.id;
            let asset_type = asset.kind;
            let repo_path = repository.path.clone();
            let storage_path = storage_path.to_string();
            let original_filename = asset.original_filename.clone();
            let file_size = asset.file_size;
            let mime_type = asset.mime_type.clone();

            match task {
                Task::ExtractMetadata => Box::pin(async move {
                    let metadata_job = MetadataJob {
                        asset_id,
                        repo_path,
                        storage_path,
                        asset_type,
                        original_filename,
                        file_size,
                        mime_type,
                    };
                    let result = match asset_type {
                        AssetKind::Photo => photo::metadata_errors(&catalog, &metadata_job).await,
                        AssetKind::Video => video::metadata_errors(&catalog, &metadata_job).await,
                        AssetKind::Audio => audio::metadata_errors(&catalog, &metadata_job).await,
                    };
                    (Task::ExtractMetadata, result)
                }) as RetryTask,

                Task::GenerateThumbnails | Task::SaveThumbnails => Box::pin(async move {
                    let thumbnail_job =
                        ThumbnailJob { asset_id, repo_path, storage_path, asset_type };
                    let result = match asset_type {
                        AssetKind::Photo => photo::thumbnail_errors(&storage, &catalog, &thumbnail_job).await,
                        AssetKind::Video => video::thumbnail_errors(&storage, &catalog, &thumbnail_job).await,
                        AssetKind::Audio => Ok(Vec::new()),
                    };
                    (task, result)
                }) as RetryTask,

                Task::TranscodeVideo | Task::TranscodeAudio => Box::pin(async move {
                    let transcode_job =
                        TranscodeJob { asset_id, repo_path, storage_path, asset_type };
                    let result = match asset_type {
                        AssetKind::Video => video::transcode_errors(&storage, &catalog, &transcode_job).await,
                        AssetKind::Audio => audio::transcode_errors(&storage, &catalog, &transcode_job).await,
                        AssetKind::Photo => Ok(Vec::new()),
                    };
                    (task, result)
                }) as RetryTask,

                Task::ClipProcessing => Box::pin(async move {
                    let result = retry_clip(
                        &catalog,
                        &ml_client,
                        &repository,
                        asset_id,
                        &storage_path,
                        &original_filename,
                    )
                    .await;
                    (Task::ClipProcessing, result)
                }) as RetryTask,

                // OCR/caption/face are best-effort consumers that never write
                // to Asset.status, and generate_waveform/extract_exif never
                // become a standalone failed task either — retrying any of
                // these is a deliberate, acknowledged no-op.
                _ => Box::pin(async move { (task, Ok(Vec::new())) }) as RetryTask,
            }
        })
        .collect()
}

async fn retry_clip(
    catalog: &Arc<dyn CatalogLayer>,
    ml_client: &Arc<MlClient>,
    repository: &Repository,
    asset_id: AssetID,
    storage_path: &str,
    original_filename: &str,
) -> Result<Vec<TaskError>> {
    let full_path = repository.path.join(storage_path);

    let source_bytes = if files::is_raw_file(original_filename) {
        match raw::extract_preview(&full_path, raw::RawOptions::default()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(asset_id = %asset_id, "RAW preview unavailable, falling back to on-disk file: {e}");
                tokio::fs::read(&full_path).await?
            }
        }
    } else {
        tokio::fs::read(&full_path).await?
    };

    let options = imaging::clip_options();
    let image_data = tokio::task::spawn_blocking(move || imaging::resize_single(&source_bytes, options))
        .await
        .map_err(|e| EngineError::Internal(format!("retry resize task panicked: {e}")))??;

    let job = PreprocessedImageJob { asset_id, image_data };
    clip::clip_errors(catalog, ml_client, &job).await
}
