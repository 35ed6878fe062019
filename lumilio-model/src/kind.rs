use serde::{Deserialize, Serialize};

/// Canonical asset kind, resolved during ingest validation from the
/// declared content type and file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Photo,
    Video,
    Audio,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Photo => "photo",
            AssetKind::Video => "video",
            AssetKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Thumbnail/version artifact label. `Waveform` is produced directly by the
/// audio pipeline rather than the fan-out resizer, so it carries no bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
    Waveform,
}

impl ThumbnailSize {
    /// The sizes the fan-out resizer produces. Excludes `Waveform`.
    pub const RESIZABLE: [ThumbnailSize; 3] = [
        ThumbnailSize::Small,
        ThumbnailSize::Medium,
        ThumbnailSize::Large,
    ];

    pub fn bound_px(&self) -> Option<u32> {
        match self {
            ThumbnailSize::Small => Some(400),
            ThumbnailSize::Medium => Some(800),
            ThumbnailSize::Large => Some(1920),
            ThumbnailSize::Waveform => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThumbnailSize::Small => "small",
            ThumbnailSize::Medium => "medium",
            ThumbnailSize::Large => "large",
            ThumbnailSize::Waveform => "waveform",
        }
    }
}

/// Version artifact label for transcoded video/audio; today only `web` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionLabel {
    Web,
}

impl VersionLabel {
    pub fn label(&self) -> &'static str {
        "web"
    }
}
