//! Ingest entry point: validate a staged file, create the catalog record,
//! commit it into the repository's inbox, and fan out the work required
//! for its media kind.

use std::str::FromStr;
use std::sync::Arc;

use lumilio_model::ids::{OwnerID, RepoID};
use lumilio_model::jobs::{
    IngestJob, MetadataJob, ThumbnailJob, TranscodeJob, QUEUE_METADATA, QUEUE_THUMBNAIL,
    QUEUE_TRANSCODE,
};
use lumilio_model::kind::AssetKind;
use lumilio_model::{Asset, AssetStatus, EngineError, Repository, Result};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::files;
use crate::pipeline::ml_preprocess;
use crate::ports::{enqueue_job, NewAsset};
use crate::raw;

/// `OwnerID` is hard-coded to a fixed, non-null placeholder for any
/// non-anonymous upload until the auth service is integrated. Preserves the
/// "non-null whenever `user_id != anonymous`" contract without inventing a
/// real identity resolution step.
pub const PLACEHOLDER_OWNER_ID: OwnerID = OwnerID(Uuid::from_u128(1));

#[instrument(skip(ctx, payload), fields(file_name = %payload.file_name))]
pub async fn ingest(ctx: &EngineContext, payload: IngestJob) -> Result<Asset> {
    let repository = resolve_repository(ctx, payload.repository_id.as_deref()).await?;

    let kind = files::classify(&payload.content_type, &payload.file_name).ok_or_else(|| {
        EngineError::Validation(format!(
            "file validation failed: unsupported content type/extension for {}",
            payload.file_name
        ))
    })?;

    let file_size = tokio::fs::metadata(&payload.staged_path)
        .await
        .map_err(|_| EngineError::Precondition("staged file not found".into()))?
        .len();

    let owner_id = if payload.user_id != "anonymous" { Some(PLACEHOLDER_OWNER_ID) } else { None };
    let sanitized_name = files::sanitize_basename(&payload.file_name);

    let asset = ctx
        .catalog
        .create_asset_record(NewAsset {
            repository_id: repository.id,
            owner_id,
            kind,
            mime_type: payload.content_type.clone(),
            hash: payload.client_hash.clone(),
            file_size,
            original_filename: sanitized_name.clone(),
        })
        .await?;

    let storage_path = ctx
        .storage
        .commit_staged_file(&payload.staged_path, &sanitized_name, &payload.client_hash, &repository)
        .await?;

    ctx.catalog
        .update_asset_storage_path_and_status(
            asset.id,
            storage_path.clone(),
            AssetStatus::processing("asset committed to repository"),
        )
        .await?;

    info!(asset_id = %asset.id, kind = %kind, "ingest committed, fanning out");

    enqueue_job(
        ctx.queue.as_ref(),
        QUEUE_METADATA,
        &MetadataJob {
            asset_id: asset.id,
            repo_path: repository.path.clone(),
            storage_path: storage_path.clone(),
            asset_type: kind,
            original_filename: sanitized_name.clone(),
            file_size,
            mime_type: payload.content_type.clone(),
        },
    )
    .await?;

    match kind {
        AssetKind::Photo => {
            enqueue_job(
                ctx.queue.as_ref(),
                QUEUE_THUMBNAIL,
                &ThumbnailJob {
                    asset_id: asset.id,
                    repo_path: repository.path.clone(),
                    storage_path: storage_path.clone(),
                    asset_type: kind,
                },
            )
            .await?;

            if ctx.feature_flags.any_enabled() {
                if let Some(bytes) =
                    resolve_ml_source(&repository, &storage_path, &sanitized_name).await
                {
                    ml_preprocess::run(&ctx.queue, ctx.feature_flags, asset.id, Arc::new(bytes)).await;
                }
            }
        }
        AssetKind::Video => {
            enqueue_job(
                ctx.queue.as_ref(),
                QUEUE_THUMBNAIL,
                &ThumbnailJob {
                    asset_id: asset.id,
                    repo_path: repository.path.clone(),
                    storage_path: storage_path.clone(),
                    asset_type: kind,
                },
            )
            .await?;
            enqueue_job(
                ctx.queue.as_ref(),
                QUEUE_TRANSCODE,
                &TranscodeJob {
                    asset_id: asset.id,
                    repo_path: repository.path.clone(),
                    storage_path: storage_path.clone(),
                    asset_type: kind,
                },
            )
            .await?;
        }
        AssetKind::Audio => {
            enqueue_job(
                ctx.queue.as_ref(),
                QUEUE_TRANSCODE,
                &TranscodeJob {
                    asset_id: asset.id,
                    repo_path: repository.path.clone(),
                    storage_path: storage_path.clone(),
                    asset_type: kind,
                },
            )
            .await?;
        }
    }

    ctx.catalog.get_asset_by_id(asset.id).await
}

async fn resolve_repository(ctx: &EngineContext, repository_id: Option<&str>) -> Result<Repository> {
    match repository_id {
        Some(raw_id) => {
            let id = RepoID::from_str(raw_id)
                .map_err(|_| EngineError::Validation("invalid repository".into()))?;
            ctx.storage.get_repository(id).await
        }
        None => {
            let mut repositories = ctx.storage.list_repositories().await?;
            if repositories.is_empty() {
                return Err(EngineError::Validation("no repository available".into()));
            }
            Ok(repositories.remove(0))
        }
    }
}

/// Resolves the single byte buffer every enabled ML preprocess substep
/// resizes from: the RAW embedded preview when the source is RAW, else the
/// committed on-disk file.
async fn resolve_ml_source(
    repository: &Repository,
    storage_path: &str,
    original_filename: &str,
) -> Option<Vec<u8>> {
    let full_path = repository.path.join(storage_path);

    if files::is_raw_file(original_filename) {
        match raw::extract_preview(&full_path, raw::RawOptions::default()).await {
            Ok(bytes) => return Some(bytes),
            Err(e) => {
                warn!("RAW preview unavailable for ML preprocessing, falling back to on-disk file: {e}");
            }
        }
    }

    tokio::fs::read(&full_path).await.ok()
}
