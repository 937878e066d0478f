use crate::ffmpeg::MediaInfo;
use crate::utils::format_time;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions offered by the open dialog and accepted on drop
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "ts", "flv"];

/// A probed video file that can be previewed and trimmed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub info: MediaInfo,
}

impl MediaFile {
    pub fn new(path: PathBuf, info: MediaInfo) -> Self {
        Self { path, info }
    }

    pub fn filename(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.display().to_string(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.info.duration
    }

    pub fn resolution_string(&self) -> String {
        match (self.info.width, self.info.height) {
            (0, _) | (_, 0) => "N/A".to_string(),
            (w, h) => format!("{}x{}", w, h),
        }
    }

    /// One-line summary for the status and preview areas
    pub fn summary(&self) -> String {
        let mut parts = vec![self.filename(), self.resolution_string()];
        if let Some(codec) = &self.info.video_codec {
            match self.info.framerate {
                Some(fps) => parts.push(format!("{} @ {:.2} fps", codec, fps)),
                None => parts.push(codec.clone()),
            }
        }
        parts.push(format_time(self.info.duration));
        parts.push(human_size(self.info.file_size));
        parts.join(" | ")
    }
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
