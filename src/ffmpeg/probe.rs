use super::backend::FfmpegBackend;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub framerate: Option<f64>,
    pub format_name: String,
    pub file_size: u64,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }
}

/// The subset of `ffprobe -print_format json` output that is read
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeReport {
    format: ProbeFormat,
    streams: Vec<ProbeStream>,
}

/// ffprobe prints numeric format fields as strings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeFormat {
    duration: Option<String>,
    format_name: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: u32,
    height: u32,
    r_frame_rate: Option<String>,
}

/// Read container and stream metadata of `path` with ffprobe.
pub fn probe_file(backend: &FfmpegBackend, path: &Path) -> Result<MediaInfo> {
    let output = Command::new(backend.ffprobe())
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .context("could not run ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe rejected {}: {}", path.display(), stderr.trim());
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
    log::debug!(
        "probed {}: {:.3}s {}x{} {:?}",
        path.display(),
        info.duration,
        info.width,
        info.height,
        info.video_codec
    );
    Ok(info)
}

fn parse_probe_output(json: &str) -> Result<MediaInfo> {
    let report: ProbeReport =
        serde_json::from_str(json).map_err(|e| anyhow!("unreadable ffprobe report: {}", e))?;

    let format = report.format;
    let mut info = MediaInfo {
        duration: format
            .duration
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0),
        format_name: format.format_name.unwrap_or_default(),
        file_size: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        ..Default::default()
    };

    // First stream of each kind wins; attached cover art is a later video stream
    if let Some(video) = report.streams.iter().find(|s| s.codec_type == "video") {
        info.video_codec = video.codec_name.clone();
        info.width = video.width;
        info.height = video.height;
        info.framerate = video.r_frame_rate.as_deref().and_then(parse_framerate);
    }
    info.audio_codec = report
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .and_then(|s| s.codec_name.clone());

    Ok(info)
}

/// `30000/1001` style rational, or a plain number
fn parse_framerate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let (num, den) = (num.parse::<f64>().ok()?, den.parse::<f64>().ok()?);
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse().ok(),
    }
}
