//! Extracts embedded JPEG previews from camera RAW files. The on-disk RAW
//! decoder itself is an external collaborator; this module only reaches for
//! the preview JPEG EXIF already carries, with a bounded full-render
//! fallback window reserved for a future decoder integration.

use std::path::Path;
use std::time::Duration;

use exif::{In, Tag};
use lumilio_model::{EngineError, Result};
use tokio::time::timeout;

#[derive(Debug, Clone, Copy)]
pub struct RawOptions {
    pub prefer_embedded: bool,
    pub quality: u8,
    pub full_render_timeout: Duration,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            prefer_embedded: true,
            quality: 90,
            full_render_timeout: Duration::from_secs(30),
        }
    }
}

/// Best-effort embedded-preview extraction. Returns `Ok(bytes)` with a
/// non-empty JPEG buffer on success. A RAW file with no extractable preview
/// is reported as the fatal `"no preview data"` condition named by the
/// processing contract — callers surface it as a fatal task error rather
/// than retrying.
pub async fn extract_preview(path: &Path, options: RawOptions) -> Result<Vec<u8>> {
    let path = path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || extract_preview_blocking(&path, options));

    match timeout(options.full_render_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(EngineError::Internal(format!(
            "RAW preview extraction task failed: {join_err}"
        ))),
        Err(_) => Err(EngineError::Fatal {
            task: "generate_thumbnails".into(),
            message: format!(
                "RAW full-render timed out after {:?}",
                options.full_render_timeout
            ),
        }),
    }
}

fn extract_preview_blocking(path: &Path, options: RawOptions) -> Result<Vec<u8>> {
    if !options.prefer_embedded {
        return Err(no_preview_data());
    }

    let file = std::fs::File::open(path)?;
    let mut bufreader = std::io::BufReader::new(file);
    let exif_reader = exif::Reader::new();
    let fields = exif_reader
        .read_from_container(&mut bufreader)
        .map_err(|_| no_preview_data())?;

    let offset = fields
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)
        .and_then(|f| f.value.get_uint(0));
    let length = fields
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)
        .and_then(|f| f.value.get_uint(0));

    let (Some(offset), Some(length)) = (offset, length) else {
        return Err(no_preview_data());
    };
    if length == 0 {
        return Err(no_preview_data());
    }

    let raw_bytes = std::fs::read(path)?;
    let start = offset as usize;
    let end = start.saturating_add(length as usize);
    if end > raw_bytes.len() {
        return Err(no_preview_data());
    }

    Ok(raw_bytes[start..end].to_vec())
}

fn no_preview_data() -> EngineError {
    EngineError::Fatal {
        task: "generate_thumbnails".into(),
        message: "no preview data".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_contract() {
        let opts = RawOptions::default();
        assert!(opts.prefer_embedded);
        assert_eq!(opts.quality, 90);
        assert_eq!(opts.full_render_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_preview_is_fatal_not_transient() {
        match no_preview_data() {
            EngineError::Fatal { message, .. } => assert_eq!(message, "no preview data"),
            other => panic!("expected Fatal, got {other:?}"),
        }
    }
}
