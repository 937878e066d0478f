use crate::ffmpeg::{FfmpegPaths, TrimMode};
use crate::timeline::MAX_THUMBNAILS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "video_trimmer";
const MAX_ANALYSIS_FRAMES: usize = 8;

/// User settings, read from `config.json` then overridden by the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub thumbnail_count: usize,
    pub default_trim_mode: TrimMode,
    pub analysis_url: Option<String>,
    pub analysis_api_key: Option<String>,
    pub analysis_prompt: Option<String>,
    pub analysis_frames: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            thumbnail_count: 12,
            default_trim_mode: TrimMode::default(),
            analysis_url: None,
            analysis_api_key: None,
            analysis_prompt: None,
            analysis_frames: 4,
        }
    }
}

impl AppConfig {
    /// Load from the platform config directory; problems fall back to defaults
    pub fn load() -> Self {
        let mut config = match config_file() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring config {}: {:#}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.sanitize();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(text).context("invalid config JSON")?;
        config.sanitize();
        Ok(config)
    }

    /// Environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("VIDEO_TRIMMER_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty("VIDEO_TRIMMER_FFPROBE") {
            self.ffprobe_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty("VIDEO_TRIMMER_ANALYSIS_URL") {
            self.analysis_url = Some(v);
        }
        if let Some(v) = non_empty("VIDEO_TRIMMER_ANALYSIS_KEY") {
            self.analysis_api_key = Some(v);
        }
    }

    fn sanitize(&mut self) {
        self.thumbnail_count = self.thumbnail_count.clamp(1, MAX_THUMBNAILS);
        self.analysis_frames = self.analysis_frames.clamp(1, MAX_ANALYSIS_FRAMES);
        if self.analysis_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            self.analysis_url = None;
        }
    }

    pub fn ffmpeg_paths(&self) -> FfmpegPaths {
        FfmpegPaths {
            ffmpeg: self.ffmpeg_path.clone(),
            ffprobe: self.ffprobe_path.clone(),
        }
    }

    pub fn analysis_enabled(&self) -> bool {
        self.analysis_url.is_some()
    }
}

fn config_file() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
