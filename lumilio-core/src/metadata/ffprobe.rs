//! Thin wrapper around the `ffprobe` binary (external collaborator). Shells
//! out with `-print_format json` and parses the subset of fields the
//! metadata stage needs; the full command line is the observable contract.

use std::path::Path;

use lumilio_model::{EngineError, Result};
use serde::Deserialize;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    #[serde(default)]
    sample_rate: Option<String>,
    channels: Option<u8>,
    bit_rate: Option<String>,
    duration: Option<String>,
    #[serde(rename = "avg_frame_rate")]
    avg_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoProbe {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
    pub duration_secs: Option<f64>,
    pub format_name: Option<String>,
    pub bitrate_kbps: Option<u64>,
    pub framerate: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct AudioProbe {
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
    pub bitrate_kbps: Option<u64>,
    pub duration_secs: Option<f64>,
    pub format_name: Option<String>,
}

async fn run_probe(path: &Path, select_stream: &str) -> Result<ProbeOutput> {
    let output = Command::new("ffprobe")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg("-select_streams")
        .arg(select_stream)
        .arg(path)
        .output()
        .await
        .map_err(|e| EngineError::TransientIo {
            task: "extract_metadata".into(),
            source: anyhow::anyhow!("failed to spawn ffprobe: {e}"),
        })?;

    if !output.status.success() {
        return Err(EngineError::TransientIo {
            task: "extract_metadata".into(),
            source: anyhow::anyhow!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    serde_json::from_slice(&output.stdout).map_err(EngineError::Serialization)
}

/// `ffprobe ... -select_streams v:0`, first video stream.
pub async fn probe_video(path: &Path) -> Result<VideoProbe> {
    let probed = run_probe(path, "v:0").await?;
    let stream = probed.streams.into_iter().next();

    let duration_secs = stream
        .as_ref()
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            probed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        });

    let bitrate_kbps = stream
        .as_ref()
        .and_then(|s| s.bit_rate.as_deref())
        .and_then(|b| b.parse::<u64>().ok())
        .or_else(|| {
            probed
                .format
                .as_ref()
                .and_then(|f| f.bit_rate.as_deref())
                .and_then(|b| b.parse::<u64>().ok())
        })
        .map(|bits| bits / 1000);

    let framerate = stream.as_ref().and_then(|s| parse_frame_rate(s.avg_frame_rate.as_deref()));

    Ok(VideoProbe {
        width: stream.as_ref().and_then(|s| s.width),
        height: stream.as_ref().and_then(|s| s.height),
        codec: stream.as_ref().and_then(|s| s.codec_name.clone()),
        duration_secs,
        format_name: probed.format.as_ref().and_then(|f| f.format_name.clone()),
        bitrate_kbps,
        framerate,
    })
}

/// `ffprobe ... -select_streams a:0`, first audio stream, falling back to
/// format-level duration/bitrate when the stream itself carries neither.
pub async fn probe_audio(path: &Path) -> Result<AudioProbe> {
    let probed = run_probe(path, "a:0").await?;
    let stream = probed.streams.into_iter().next();

    let duration_secs = stream
        .as_ref()
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            probed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        });

    let bitrate_kbps = stream
        .as_ref()
        .and_then(|s| s.bit_rate.as_deref())
        .and_then(|b| b.parse::<u64>().ok())
        .or_else(|| {
            probed
                .format
                .as_ref()
                .and_then(|f| f.bit_rate.as_deref())
                .and_then(|b| b.parse::<u64>().ok())
        })
        .map(|bits| bits / 1000);

    Ok(AudioProbe {
        codec: stream.as_ref().and_then(|s| s.codec_name.clone()),
        sample_rate: stream
            .as_ref()
            .and_then(|s| s.sample_rate.as_deref())
            .and_then(|s| s.parse::<u32>().ok()),
        channels: stream.as_ref().and_then(|s| s.channels),
        bitrate_kbps,
        duration_secs,
        format_name: probed.format.as_ref().and_then(|f| f.format_name.clone()),
    })
}

fn parse_frame_rate(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 { None } else { Some(num / den) }
}
