use crate::timeline::TimeRange;
use crate::utils::format_time_for_filename;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrimMode {
    /// Stream copy: instant, cuts land on keyframes
    #[default]
    Lossless,
    /// Fast re-encode, frame accurate
    Precise,
    HighQuality,
}

impl TrimMode {
    pub fn all() -> &'static [TrimMode] {
        &[TrimMode::Lossless, TrimMode::Precise, TrimMode::HighQuality]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrimMode::Lossless => "Lossless (fast)",
            TrimMode::Precise => "Precise",
            TrimMode::HighQuality => "High quality",
        }
    }

    pub fn reencodes(&self) -> bool {
        *self != TrimMode::Lossless
    }
}

/// Build FFmpeg arguments for cutting `range` out of `input`.
///
/// Progress is reported as `key=value` lines on stdout.
pub fn build_trim_args(input: &Path, output: &Path, range: TimeRange, mode: TrimMode) -> Vec<String> {
    let duration = range.span().max(0.0);
    let mut args = vec![
        "-y".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
    ];

    match mode {
        TrimMode::Lossless => {
            // -ss before -i: fast keyframe seek
            args.extend([
                "-ss".to_string(),
                format!("{:.3}", range.start),
                "-i".to_string(),
                input.to_string_lossy().to_string(),
                "-t".to_string(),
                format!("{:.3}", duration),
                "-c".to_string(),
                "copy".to_string(),
                "-avoid_negative_ts".to_string(),
                "make_zero".to_string(),
            ]);
        }
        TrimMode::Precise | TrimMode::HighQuality => {
            let (preset, audio_bitrate) = match mode {
                TrimMode::HighQuality => ("slow", "256k"),
                _ => ("ultrafast", "192k"),
            };
            // -ss after -i: frame accurate
            args.extend([
                "-i".to_string(),
                input.to_string_lossy().to_string(),
                "-ss".to_string(),
                format!("{:.3}", range.start),
                "-t".to_string(),
                format!("{:.3}", duration),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                preset.to_string(),
                "-crf".to_string(),
                "18".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                audio_bitrate.to_string(),
            ]);
        }
    }

    args.push(output.to_string_lossy().to_string());
    args
}

/// `<dir>/<stem>_trim_<start>-<end>.<ext>` next to the input.
///
/// Re-encoding modes always write mp4 since they produce H.264/AAC.
pub fn default_output_path(input: &Path, range: TimeRange, mode: TrimMode) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let extension = if mode.reencodes() {
        "mp4".to_string()
    } else {
        input
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string())
    };
    let file_name = format!(
        "{}_trim_{}-{}.{}",
        stem,
        format_time_for_filename(range.start),
        format_time_for_filename(range.end),
        extension
    );
    input.with_file_name(file_name)
}
