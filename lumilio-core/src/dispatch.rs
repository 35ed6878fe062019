//! Queue-name routing: deserializes a job payload and calls the pipeline
//! stage for its asset kind. This is the single place that knows the
//! mapping from queue name to handler.

use lumilio_model::jobs::{
    IngestJob, MetadataJob, PreprocessedImageJob, RetryAssetJob, ThumbnailJob, TranscodeJob,
    QUEUE_METADATA, QUEUE_PROCESS_CAPTION, QUEUE_PROCESS_CLIP, QUEUE_PROCESS_FACE,
    QUEUE_PROCESS_OCR, QUEUE_RETRY_ASSET, QUEUE_THUMBNAIL, QUEUE_TRANSCODE,
};
use lumilio_model::kind::AssetKind;
use lumilio_model::{Asset, EngineError, Result};
use tracing::instrument;

use crate::context::EngineContext;
use crate::ingest;
use crate::pipeline::{audio, clip, photo, video};
use crate::retry;

/// Routes one job's raw payload bytes to its handler by queue name.
#[instrument(skip(ctx, payload), fields(queue))]
pub async fn dispatch(ctx: &EngineContext, queue: &str, payload: &[u8]) -> Result<()> {
    match queue {
        QUEUE_METADATA => {
            let job: MetadataJob = serde_json::from_slice(payload)?;
            match job.asset_type {
                AssetKind::Photo => photo::process_metadata(&ctx.catalog, &job).await,
                AssetKind::Video => video::process_metadata(&ctx.catalog, &job).await,
                AssetKind::Audio => audio::process_metadata(&ctx.catalog, &job).await,
            }
        }
        QUEUE_THUMBNAIL => {
            let job: ThumbnailJob = serde_json::from_slice(payload)?;
            dispatch_thumbnail(ctx, &job).await
        }
        QUEUE_TRANSCODE => {
            let job: TranscodeJob = serde_json::from_slice(payload)?;
            dispatch_transcode(ctx, &job).await
        }
        QUEUE_PROCESS_CLIP => {
            let job: PreprocessedImageJob = serde_json::from_slice(payload)?;
            clip::process_clip(&ctx.catalog, &ctx.ml_client, &job).await
        }
        QUEUE_PROCESS_OCR => {
            let job: PreprocessedImageJob = serde_json::from_slice(payload)?;
            clip::process_ocr(&ctx.ml_client, &job).await;
            Ok(())
        }
        QUEUE_PROCESS_CAPTION => {
            let job: PreprocessedImageJob = serde_json::from_slice(payload)?;
            clip::process_caption(&ctx.ml_client, &job).await;
            Ok(())
        }
        QUEUE_PROCESS_FACE => {
            let job: PreprocessedImageJob = serde_json::from_slice(payload)?;
            clip::process_face(&ctx.ml_client, &job).await;
            Ok(())
        }
        QUEUE_RETRY_ASSET => {
            let job: RetryAssetJob = serde_json::from_slice(payload)?;
            retry::retry(ctx, &job).await
        }
        other => Err(EngineError::Validation(format!("unknown queue: {other}"))),
    }
}

async fn dispatch_thumbnail(ctx: &EngineContext, job: &ThumbnailJob) -> Result<()> {
    match job.asset_type {
        AssetKind::Photo => photo::process_thumbnails(&ctx.storage, &ctx.catalog, job).await,
        AssetKind::Video => video::process_thumbnails(&ctx.storage, &ctx.catalog, job).await,
        AssetKind::Audio => {
            Err(EngineError::Validation("audio assets do not receive thumbnail jobs".into()))
        }
    }
}

async fn dispatch_transcode(ctx: &EngineContext, job: &TranscodeJob) -> Result<()> {
    match job.asset_type {
        AssetKind::Video => video::process_transcode(&ctx.storage, &ctx.catalog, job).await,
        AssetKind::Audio => audio::process_transcode(&ctx.storage, &ctx.catalog, job).await,
        AssetKind::Photo => {
            Err(EngineError::Validation("photo assets do not receive transcode jobs".into()))
        }
    }
}

/// Ingest is invoked directly by the upload path rather than polled off a
/// queue, but lives behind the same dispatcher entry point for symmetry.
pub async fn dispatch_ingest(ctx: &EngineContext, job: IngestJob) -> Result<Asset> {
    ingest::ingest(ctx, job).await
}
