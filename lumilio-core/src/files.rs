//! MIME/extension classification, RAW detection, and path sanitization for
//! files discovered on disk or declared at ingest time.

use std::path::{Component, Path};

use lumilio_model::kind::AssetKind;

const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "nrw", "arw", "srf", "sr2", "orf", "rw2", "raf", "dng", "pef", "raw",
    "3fr", "erf", "kdc", "mrw", "x3f",
];

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif", "heic", "heif", "avif",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "mov", "avi", "webm", "flv", "wmv", "m4v", "mpg", "mpeg", "3gp",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "aac", "m4a", "ogg", "opus", "wma", "aiff",
];

/// Classifies a declared content type / filename pair into the canonical
/// asset kind. Extension wins when the content type is generic or absent;
/// either signal alone is enough to resolve a kind.
pub fn classify(content_type: &str, file_name: &str) -> Option<AssetKind> {
    let ext = extension_lowercase(file_name);

    if content_type.starts_with("image/") || ext.as_deref().is_some_and(is_photo_extension) {
        return Some(AssetKind::Photo);
    }
    if content_type.starts_with("video/") || ext.as_deref().is_some_and(is_video_extension) {
        return Some(AssetKind::Video);
    }
    if content_type.starts_with("audio/") || ext.as_deref().is_some_and(is_audio_extension) {
        return Some(AssetKind::Audio);
    }
    None
}

pub fn is_photo_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext) || PHOTO_EXTENSIONS.contains(&ext)
}

pub fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext)
}

pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&ext)
}

/// True when the filename's extension names a camera RAW format.
pub fn is_raw_file(file_name: &str) -> bool {
    extension_lowercase(file_name).is_some_and(|ext| RAW_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_lowercase(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Rejects any relative path that escapes its root, traverses through `..`,
/// or reaches into a reserved repository subtree (`.lumilio/*`, `inbox/*`).
pub fn sanitize_album_path(path: &str) -> Result<(), String> {
    let p = Path::new(path);

    if p.is_absolute() {
        return Err("path must be relative".into());
    }

    for component in p.components() {
        match component {
            Component::ParentDir => return Err("path escapes repository root".into()),
            Component::CurDir | Component::Normal(_) => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err("path must be relative".into());
            }
        }
    }

    let mut components = p.components();
    if let Some(Component::Normal(first)) = components.next()
        && let Some(first) = first.to_str()
        && (first == "inbox" || first == ".lumilio")
    {
        return Err(format!("path reaches into reserved subtree: {first}"));
    }

    Ok(())
}

/// Produces a filesystem-safe basename: strips directory components and any
/// leading dots that would make the file hidden or ambiguous with `..`.
pub fn sanitize_basename(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let trimmed = base.trim_start_matches('.');
    if trimmed.is_empty() { "upload".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_when_content_type_generic() {
        assert_eq!(
            classify("application/octet-stream", "photo.CR2"),
            Some(AssetKind::Photo)
        );
        assert_eq!(
            classify("application/octet-stream", "clip.mkv"),
            Some(AssetKind::Video)
        );
        assert_eq!(
            classify("application/octet-stream", "song.flac"),
            Some(AssetKind::Audio)
        );
        assert_eq!(classify("application/octet-stream", "notes.txt"), None);
    }

    #[test]
    fn raw_detection_is_case_insensitive() {
        assert!(is_raw_file("IMG_0001.CR2"));
        assert!(is_raw_file("img_0001.dng"));
        assert!(!is_raw_file("img_0001.jpg"));
    }

    #[test]
    fn path_sanitization_matches_scenarios() {
        assert!(sanitize_album_path("albums/2026/02/a.jpg").is_ok());
        assert!(sanitize_album_path(".lumilio/assets/1.jpg").is_err());
        assert!(sanitize_album_path("inbox/2026/02/a.jpg").is_err());
        assert!(sanitize_album_path("../escape/a.jpg").is_err());
    }
}
