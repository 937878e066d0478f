//! Filmstrip frame sampling through the ffmpeg CLI.

use super::backend::FfmpegBackend;
use crate::timeline::MAX_THUMBNAILS;
use anyhow::{bail, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Height of sampled thumbnails; width follows the aspect ratio
pub const THUMBNAIL_HEIGHT: u32 = 90;

/// One sampled frame, JPEG encoded
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub timestamp: f64,
    pub jpeg: Vec<u8>,
}

/// Evenly spaced sample times, one per filmstrip cell, taken at the cell centre.
///
/// `count` is clamped to `1..=MAX_THUMBNAILS`; a non-positive duration yields
/// nothing.
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let count = count.clamp(1, MAX_THUMBNAILS);
    let step = duration / count as f64;
    (0..count).map(|i| (i as f64 + 0.5) * step).collect()
}

/// Extract thumbnails for `path`, ascending by timestamp.
///
/// Frames that fail to extract are skipped; getting none at all is an error.
pub async fn sample_frames(
    backend: &FfmpegBackend,
    path: &Path,
    duration: f64,
    count: usize,
) -> Result<Vec<SampledFrame>> {
    let timestamps = sample_timestamps(duration, count);
    let mut frames = Vec::with_capacity(timestamps.len());

    for timestamp in timestamps {
        match extract_jpeg(backend, path, timestamp).await {
            Ok(jpeg) => frames.push(SampledFrame { timestamp, jpeg }),
            Err(e) => log::warn!("thumbnail at {:.3}s failed: {}", timestamp, e),
        }
    }

    if frames.is_empty() {
        bail!("no frames could be extracted from {}", path.display());
    }
    log::info!("sampled {} thumbnails from {}", frames.len(), path.display());
    Ok(frames)
}

pub fn build_thumbnail_args(path: &Path, timestamp: f64) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        // Seek before the input for speed
        "-ss".to_string(),
        format!("{:.3}", timestamp),
        "-i".to_string(),
        path.to_string_lossy().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale=-2:{}", THUMBNAIL_HEIGHT),
        "-f".to_string(),
        "image2pipe".to_string(),
        "-c:v".to_string(),
        "mjpeg".to_string(),
        "-q:v".to_string(),
        "5".to_string(),
        "-".to_string(),
    ]
}

async fn extract_jpeg(backend: &FfmpegBackend, path: &Path, timestamp: f64) -> Result<Vec<u8>> {
    let output = Command::new(backend.ffmpeg())
        .args(build_thumbnail_args(path, timestamp))
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{}", stderr.lines().last().unwrap_or("unknown error"));
    }
    if output.stdout.is_empty() {
        bail!("empty frame");
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_timestamps_spacing() {
        let ts = sample_timestamps(10.0, 5);
        assert_eq!(ts, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_sample_timestamps_bounds() {
        assert!(sample_timestamps(0.0, 10).is_empty());
        assert!(sample_timestamps(f64::INFINITY, 10).is_empty());
        assert_eq!(sample_timestamps(4.0, 0), vec![2.0]);

        let ts = sample_timestamps(600.0, 500);
        assert_eq!(ts.len(), MAX_THUMBNAILS);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
        assert!(ts.iter().all(|&t| t >= 0.0 && t < 600.0));
    }

    #[test]
    fn test_thumbnail_args() {
        let args = build_thumbnail_args(Path::new("clip.mp4"), 2.5);
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
        assert_eq!(args[ss + 1], "2.500");
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }
}
