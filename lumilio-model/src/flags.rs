use serde::{Deserialize, Serialize};

/// Feature-flag bag read by the photo ML preprocessing stage. All four
/// default to disabled; ingest returns immediately when every flag is false.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub clip_enabled: bool,
    #[serde(default)]
    pub ocr_enabled: bool,
    #[serde(default)]
    pub caption_enabled: bool,
    #[serde(default)]
    pub face_enabled: bool,
}

impl FeatureFlags {
    pub fn any_enabled(&self) -> bool {
        self.clip_enabled || self.ocr_enabled || self.caption_enabled || self.face_enabled
    }
}
