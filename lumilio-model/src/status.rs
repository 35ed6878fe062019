use serde::{Deserialize, Serialize};

/// Stable task name vocabulary. Appears in `AssetStatus.Errors[*].task` and
/// in `RetryAsset.retry_tasks`. Keep this set closed: a worker that sees an
/// unrecognized name should treat it as a no-op, never panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    ExtractExif,
    ExtractMetadata,
    GenerateThumbnails,
    SaveThumbnails,
    ClipProcessing,
    OcrProcessing,
    CaptionProcessing,
    FaceProcessing,
    TranscodeVideo,
    TranscodeAudio,
    GenerateWaveform,
    SelectiveRetry,
}

impl Task {
    /// Parses a stable task name. Unknown names return `None` so callers can
    /// treat them as a no-op rather than panicking — the vocabulary is closed
    /// but a retry request may still name something we don't recognize.
    pub fn parse(name: &str) -> Option<Task> {
        match name {
            "extract_exif" => Some(Task::ExtractExif),
            "extract_metadata" => Some(Task::ExtractMetadata),
            "generate_thumbnails" => Some(Task::GenerateThumbnails),
            "save_thumbnails" => Some(Task::SaveThumbnails),
            "clip_processing" => Some(Task::ClipProcessing),
            "ocr_processing" => Some(Task::OcrProcessing),
            "caption_processing" => Some(Task::CaptionProcessing),
            "face_processing" => Some(Task::FaceProcessing),
            "transcode_video" => Some(Task::TranscodeVideo),
            "transcode_audio" => Some(Task::TranscodeAudio),
            "generate_waveform" => Some(Task::GenerateWaveform),
            "selective_retry" => Some(Task::SelectiveRetry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::ExtractExif => "extract_exif",
            Task::ExtractMetadata => "extract_metadata",
            Task::GenerateThumbnails => "generate_thumbnails",
            Task::SaveThumbnails => "save_thumbnails",
            Task::ClipProcessing => "clip_processing",
            Task::OcrProcessing => "ocr_processing",
            Task::CaptionProcessing => "caption_processing",
            Task::FaceProcessing => "face_processing",
            Task::TranscodeVideo => "transcode_video",
            Task::TranscodeAudio => "transcode_audio",
            Task::GenerateWaveform => "generate_waveform",
            Task::SelectiveRetry => "selective_retry",
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub task: Task,
    pub error: String,
    #[serde(default)]
    pub fatal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Processing,
    Complete,
    Warning,
    Failed,
}

/// Persisted into `Asset.status` as JSON. The front-end only ever sees one
/// of the four phases plus the list of stable task names that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetStatus {
    pub phase: Phase,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<TaskError>,
}

impl AssetStatus {
    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Processing,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Complete,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>, errors: Vec<TaskError>) -> Self {
        Self {
            phase: Phase::Failed,
            message: message.into(),
            errors,
        }
    }

    pub fn warning(message: impl Into<String>, errors: Vec<TaskError>) -> Self {
        Self {
            phase: Phase::Warning,
            message: message.into(),
            errors,
        }
    }

    /// True iff this status represents a terminal state eligible for retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self.phase, Phase::Warning | Phase::Failed)
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.errors.iter().any(|e| e.fatal)
    }

    /// Distinct task names currently recorded as failed, in first-seen order.
    pub fn get_failed_tasks(&self) -> Vec<Task> {
        let mut seen = Vec::new();
        for e in &self.errors {
            if !seen.contains(&e.task) {
                seen.push(e.task);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_phases() {
        assert!(AssetStatus::warning("x", vec![]).is_retryable());
        assert!(AssetStatus::failed("x", vec![]).is_retryable());
        assert!(!AssetStatus::complete("x").is_retryable());
        assert!(!AssetStatus::processing("x").is_retryable());
    }

    #[test]
    fn failed_tasks_are_distinct_and_ordered() {
        let status = AssetStatus::warning(
            "partial",
            vec![
                TaskError {
                    task: Task::GenerateThumbnails,
                    error: "boom".into(),
                    fatal: false,
                },
                TaskError {
                    task: Task::ClipProcessing,
                    error: "boom2".into(),
                    fatal: false,
                },
                TaskError {
                    task: Task::GenerateThumbnails,
                    error: "boom3".into(),
                    fatal: false,
                },
            ],
        );
        assert_eq!(
            status.get_failed_tasks(),
            vec![Task::GenerateThumbnails, Task::ClipProcessing]
        );
    }

    #[test]
    fn parse_round_trips_every_task() {
        let all = [
            Task::ExtractExif,
            Task::ExtractMetadata,
            Task::GenerateThumbnails,
            Task::SaveThumbnails,
            Task::ClipProcessing,
            Task::OcrProcessing,
            Task::CaptionProcessing,
            Task::FaceProcessing,
            Task::TranscodeVideo,
            Task::TranscodeAudio,
            Task::GenerateWaveform,
            Task::SelectiveRetry,
        ];
        for task in all {
            assert_eq!(Task::parse(task.as_str()), Some(task));
        }
        assert_eq!(Task::parse("not_a_real_task"), None);
    }

    #[test]
    fn fatal_error_detection() {
        let status = AssetStatus::failed(
            "bad",
            vec![TaskError {
                task: Task::ClipProcessing,
                error: "no preview data".into(),
                fatal: true,
            }],
        );
        assert!(status.has_fatal_errors());
    }
}
