//! Thin wrappers around the `ffmpeg` binary (external collaborator): each
//! function's argument list is the observable contract from the processing
//! design, not an implementation detail.

use std::path::Path;

use lumilio_model::{EngineError, Result};
use tokio::process::Command;

async fn run_ffmpeg(args: &[&str], task: &str) -> Result<()> {
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .await
        .map_err(|e| EngineError::TransientIo {
            task: task.into(),
            source: anyhow::anyhow!("failed to spawn ffmpeg: {e}"),
        })?;

    if !output.status.success() {
        return Err(EngineError::TransientIo {
            task: task.into(),
            source: anyhow::anyhow!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }
    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| EngineError::Internal(format!("non-UTF8 path: {}", path.display())))
}

pub fn format_timestamp(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Representative-frame extraction for video thumbnails: input seeking,
/// bounded to `1920x1080` preserving aspect ratio, JPEG `-q:v 2`.
pub async fn extract_frame(input: &Path, timestamp_secs: u64, output: &Path) -> Result<()> {
    let timestamp = format_timestamp(timestamp_secs);
    run_ffmpeg(
        &[
            "-ss",
            &timestamp,
            "-i",
            path_str(input)?,
            "-vf",
            "scale='min(1920,iw)':'min(1080,ih)':force_original_aspect_ratio=decrease",
            "-frames:v",
            "1",
            "-q:v",
            "2",
            "-threads",
            "1",
            "-y",
            path_str(output)?,
        ],
        "generate_thumbnails",
    )
    .await
}

pub async fn copy_video(input: &Path, output: &Path) -> Result<()> {
    run_ffmpeg(
        &["-i", path_str(input)?, "-c", "copy", "-movflags", "+faststart", "-y", path_str(output)?],
        "transcode_video",
    )
    .await
}

pub async fn transcode_video(input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
    let scale = format!("scale={width}:{height}");
    run_ffmpeg(
        &[
            "-i",
            path_str(input)?,
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-maxrate",
            "5000k",
            "-bufsize",
            "10000k",
            "-vf",
            &scale,
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-movflags",
            "+faststart",
            "-avoid_negative_ts",
            "make_zero",
            "-threads",
            "0",
            "-f",
            "mp4",
            "-y",
            path_str(output)?,
        ],
        "transcode_video",
    )
    .await
}

pub async fn copy_audio(input: &Path, output: &Path) -> Result<()> {
    run_ffmpeg(&["-i", path_str(input)?, "-c", "copy", "-y", path_str(output)?], "transcode_audio").await
}

pub async fn transcode_audio(
    input: &Path,
    output: &Path,
    target_bitrate: &str,
    channels: u8,
) -> Result<()> {
    let ac = if channels == 1 { "1" } else { "2" };
    run_ffmpeg(
        &[
            "-i",
            path_str(input)?,
            "-c:a",
            "libmp3lame",
            "-b:a",
            target_bitrate,
            "-q:a",
            "2",
            "-ar",
            "44100",
            "-ac",
            ac,
            "-f",
            "mp3",
            "-y",
            path_str(output)?,
        ],
        "transcode_audio",
    )
    .await
}

pub async fn generate_waveform(input: &Path, output: &Path) -> Result<()> {
    run_ffmpeg(
        &[
            "-i",
            path_str(input)?,
            "-filter_complex",
            "showwavespic=s=1200x200:colors=0x3b82f6[v]",
            "-map",
            "[v]",
            "-frames:v",
            "1",
            "-f",
            "image2",
            "-y",
            path_str(output)?,
        ],
        "generate_waveform",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamps_as_hh_mm_ss() {
        assert_eq!(format_timestamp(1), "00:00:01");
        assert_eq!(format_timestamp(75), "00:01:15");
        assert_eq!(format_timestamp(3661), "01:01:01");
    }
}
