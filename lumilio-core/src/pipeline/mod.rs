//! Per-kind pipeline stage handlers: the job-dispatcher entry points that
//! load an asset and its repository by id, do the stage's work, and report
//! the outcome through [`crate::status_merge`].

pub mod audio;
pub mod clip;
pub mod ml_preprocess;
pub mod photo;
pub mod video;

const PHOTO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const PHOTO_RAW_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(45);
const VIDEO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30 * 60);
const AUDIO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15 * 60);
