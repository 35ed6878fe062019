//! Per-kind metadata extraction: a streaming reader that, given a file path
//! and declared asset kind, produces a typed metadata record.

pub mod exif;
pub mod ffprobe;

use std::path::Path;
use std::sync::OnceLock;

use lumilio_model::metadata::{AudioMeta, PhotoMeta, SpecificMetadata, VideoMeta};
use lumilio_model::Result;
use regex::Regex;

use self::exif::ExifOptions;
use crate::files;

/// Everything the metadata stage writes back to the catalog for one asset.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub specific: Option<SpecificMetadata>,
}

fn dimension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\D+(\d+)").expect("static pattern is valid"))
}

/// Parses a `"<width>x<height>"`-shaped dimensions string, as returned by
/// the EXIF reader's display value for composite dimension tags.
pub fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let caps = dimension_pattern().captures(raw)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;
    Some((width, height))
}

pub async fn extract_photo(path: &Path, original_filename: &str) -> Result<ExtractedMetadata> {
    let exif_data = exif::extract(path, ExifOptions::PHOTO).await?;

    let (width, height) = match exif_data.dimensions {
        Some((w, h)) => (Some(w), Some(h)),
        None => image_dimensions_fallback(path),
    };

    let photo = PhotoMeta {
        is_raw: files::is_raw_file(original_filename),
        camera_make: exif_data.camera_make,
        camera_model: exif_data.camera_model,
        lens_model: exif_data.lens_model,
        iso: exif_data.iso,
        f_number: exif_data.f_number,
        exposure_time: exif_data.exposure_time,
        focal_length: exif_data.focal_length,
        gps_latitude: exif_data.gps_latitude,
        gps_longitude: exif_data.gps_longitude,
    };

    Ok(ExtractedMetadata {
        width,
        height,
        duration_secs: None,
        specific: Some(SpecificMetadata::Photo(photo)),
    })
}

pub async fn extract_video(path: &Path) -> Result<ExtractedMetadata> {
    let probe = ffprobe::probe_video(path).await?;
    // Secondary pass: fast EXIF extraction can surface container-level tags
    // ffprobe does not (e.g. a camera-embedded creation comment); failures
    // here are non-fatal since the primary source is ffprobe.
    let exif_data = exif::extract(path, ExifOptions::VIDEO).await.unwrap_or_default();

    let video = VideoMeta {
        codec: probe.codec,
        audio_codec: None,
        bitrate_kbps: probe.bitrate_kbps,
        framerate: probe.framerate,
        container_format: probe.format_name,
    };

    Ok(ExtractedMetadata {
        width: probe.width.or(exif_data.dimensions.map(|d| d.0)),
        height: probe.height.or(exif_data.dimensions.map(|d| d.1)),
        duration_secs: probe.duration_secs,
        specific: Some(SpecificMetadata::Video(video)),
    })
}

pub async fn extract_audio(path: &Path) -> Result<ExtractedMetadata> {
    let probe = ffprobe::probe_audio(path).await?;
    let _ = exif::extract(path, ExifOptions::AUDIO).await; // best-effort, rarely present

    let audio = AudioMeta {
        codec: probe.codec,
        sample_rate: probe.sample_rate,
        channels: probe.channels,
        bitrate_kbps: probe.bitrate_kbps,
        container_format: probe.format_name,
    };

    Ok(ExtractedMetadata {
        width: None,
        height: None,
        duration_secs: probe.duration_secs,
        specific: Some(SpecificMetadata::Audio(audio)),
    })
}

fn image_dimensions_fallback(path: &Path) -> (Option<u32>, Option<u32>) {
    match image::image_dimensions(path) {
        Ok((w, h)) => (Some(w), Some(h)),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_strings() {
        assert_eq!(parse_dimensions("4032x3024"), Some((4032, 3024)));
        assert_eq!(parse_dimensions("1920 x 1080"), Some((1920, 1080)));
        assert_eq!(parse_dimensions("not-a-size"), None);
    }
}
