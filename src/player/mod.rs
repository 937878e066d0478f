mod sync;

pub use sync::*;

use crate::ffmpeg::FfmpegBackend;
use crate::project::MediaFile;
use crate::session::PlaybackSurface;
use anyhow::{bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Largest preview frame; the source is scaled down to fit
const PREVIEW_MAX_WIDTH: u32 = 854;
const PREVIEW_MAX_HEIGHT: u32 = 480;

/// Seconds of playback between preview frame requests
const FRAME_INTERVAL: f64 = 0.1;

/// A decoded RGBA video frame
#[derive(Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts: f64,
}

/// Preview dimensions for a `width`x`height` source, keeping the aspect
/// ratio and rounding to even sizes.
pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (PREVIEW_MAX_WIDTH, PREVIEW_MAX_HEIGHT);
    }
    let scale = (PREVIEW_MAX_WIDTH as f64 / width as f64)
        .min(PREVIEW_MAX_HEIGHT as f64 / height as f64)
        .min(1.0);
    let even = |v: f64| ((v.round() as u32) / 2 * 2).max(2);
    (even(width as f64 * scale), even(height as f64 * scale))
}

/// Playback surface backed by the ffmpeg CLI.
///
/// Time is kept by a wall clock; frames are extracted on a worker thread
/// that only ever serves the most recent request.
pub struct MediaPlayer {
    path: PathBuf,
    duration: f64,
    clock: Arc<Mutex<PlaybackClock>>,
    current_frame: Arc<Mutex<Option<VideoFrame>>>,
    requests: Sender<f64>,
    last_requested: f64,
}

impl MediaPlayer {
    pub fn new(backend: Arc<FfmpegBackend>, media: &MediaFile) -> Self {
        let (requests, rx) = unbounded();
        let current_frame = Arc::new(Mutex::new(None));
        let (width, height) = preview_size(media.info.width, media.info.height);

        let worker = FrameWorker {
            backend,
            path: media.path.clone(),
            width,
            height,
            current_frame: current_frame.clone(),
        };
        std::thread::spawn(move || worker.run(rx));

        let mut player = Self {
            path: media.path.clone(),
            duration: media.duration(),
            clock: Arc::new(Mutex::new(PlaybackClock::new())),
            current_frame,
            requests,
            last_requested: f64::NAN,
        };
        player.request_frame(0.0);
        player
    }

    /// Advance playback. Call once per UI frame.
    pub fn update(&mut self) {
        if !self.is_playing() {
            return;
        }
        let time = self.clock.lock().time();
        if time >= self.duration {
            let mut clock = self.clock.lock();
            clock.pause();
            clock.set_time(self.duration);
            drop(clock);
            self.request_frame(self.duration);
            return;
        }
        if self.last_requested.is_nan() || (time - self.last_requested).abs() >= FRAME_INTERVAL {
            self.request_frame(time);
        }
    }

    /// A frame decoded since the last call, if any
    pub fn take_frame(&self) -> Option<VideoFrame> {
        self.current_frame.lock().take()
    }

    fn request_frame(&mut self, time: f64) {
        self.last_requested = time;
        if self.requests.send(time).is_err() {
            log::warn!("frame worker for {} has stopped", self.path.display());
        }
    }
}

impl PlaybackSurface for MediaPlayer {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.clock.lock().time().clamp(0.0, self.duration)
    }

    fn is_playing(&self) -> bool {
        !self.clock.lock().is_paused()
    }

    fn play(&mut self) {
        if self.current_time() >= self.duration {
            self.clock.lock().set_time(0.0);
        }
        self.clock.lock().resume();
    }

    fn pause(&mut self) {
        self.clock.lock().pause();
        let time = self.current_time();
        self.request_frame(time);
    }

    fn seek(&mut self, time: f64) {
        let clamped = time.clamp(0.0, self.duration);
        self.clock.lock().set_time(clamped);
        self.request_frame(clamped);
    }
}

struct FrameWorker {
    backend: Arc<FfmpegBackend>,
    path: PathBuf,
    width: u32,
    height: u32,
    current_frame: Arc<Mutex<Option<VideoFrame>>>,
}

impl FrameWorker {
    /// Serve requests until the player is dropped
    fn run(self, rx: Receiver<f64>) {
        while let Ok(mut time) = rx.recv() {
            // Only the newest position matters
            while let Ok(next) = rx.try_recv() {
                time = next;
            }
            match self.extract(time) {
                Ok(frame) => *self.current_frame.lock() = Some(frame),
                Err(e) => log::debug!("frame at {:.3}s: {}", time, e),
            }
        }
        log::debug!("frame worker for {} exiting", self.path.display());
    }

    fn extract(&self, time: f64) -> Result<VideoFrame> {
        let output = Command::new(self.backend.ffmpeg())
            .args(build_frame_args(&self.path, time, self.width, self.height))
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg failed: {}", stderr.lines().last().unwrap_or("unknown error"));
        }

        let expected = (self.width * self.height * 4) as usize;
        if output.stdout.len() != expected {
            bail!("unexpected frame size: got {} bytes, expected {}", output.stdout.len(), expected);
        }

        Ok(VideoFrame {
            data: output.stdout,
            width: self.width,
            height: self.height,
            pts: time,
        })
    }
}

/// Single RGBA frame at `time`, written raw to stdout
fn build_frame_args(path: &Path, time: f64, width: u32, height: u32) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{:.3}", time),
        "-i".to_string(),
        path.to_string_lossy().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", width, height),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-".to_string(),
    ]
}
