use crate::analysis::{pick_evenly, AnalysisClient, AnalysisFrame, AnalysisResult};
use crate::config::AppConfig;
use crate::export::{create_shared_queue, JobStatus, SharedQueue};
use crate::ffmpeg::{self, default_output_path, FfmpegBackend, SampledFrame, Transcoder, TrimMode};
use crate::player::MediaPlayer;
use crate::project::{is_video_file, MediaFile, VIDEO_EXTENSIONS};
use crate::session::{MediaSession, PlaybackSurface};
use crate::timeline::{FrameThumbnail, TimeRange, TimelineAction, TimelineController};
use crate::ui::{frame_to_image, Thumbnail};
use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Seconds skipped by the arrow keys and the transport buttons
pub const SEEK_STEP: f64 = 5.0;

/// Results coming back from background work
enum AppEvent {
    Thumbnails {
        generation: u64,
        result: Result<Vec<SampledFrame>, String>,
    },
    Analysis {
        generation: u64,
        result: Result<AnalysisResult, String>,
    },
}

#[derive(Debug, Clone, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Running,
    Done(AnalysisResult),
    Failed(String),
}

pub struct TrimmerApp {
    pub config: AppConfig,
    runtime: Runtime,
    ctx: egui::Context,
    backend: Option<Arc<FfmpegBackend>>,

    pub session: MediaSession<Thumbnail>,
    pub controller: TimelineController,
    pub player: Option<MediaPlayer>,
    pub preview_texture: Option<egui::TextureHandle>,
    pub sampling: bool,

    pub trim_mode: TrimMode,
    /// Explicit export destination; `None` derives one from the trim range
    pub output_override: Option<PathBuf>,
    pub export_queue: SharedQueue,
    pub last_export: Option<PathBuf>,

    pub analysis: AnalysisState,
    pub status_message: String,
    last_queue_message: Option<String>,

    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
}

impl TrimmerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, runtime: Runtime) -> Self {
        let (events_tx, events_rx) = unbounded();
        let mut app = Self {
            trim_mode: config.default_trim_mode,
            config,
            runtime,
            ctx: cc.egui_ctx.clone(),
            backend: None,
            session: MediaSession::new(),
            controller: TimelineController::new(),
            player: None,
            preview_texture: None,
            sampling: false,
            output_override: None,
            export_queue: create_shared_queue(),
            last_export: None,
            analysis: AnalysisState::Idle,
            status_message: String::from("Ready"),
            last_queue_message: None,
            events_tx,
            events_rx,
        };
        if let Err(e) = app.backend() {
            app.status_message = format!("{:#}", e);
        }
        app
    }

    /// Shared FFmpeg backend; a failed lookup is retried on the next call
    fn backend(&mut self) -> Result<Arc<FfmpegBackend>> {
        if let Some(backend) = &self.backend {
            return Ok(backend.clone());
        }
        let backend = ffmpeg::acquire(&self.config.ffmpeg_paths())?;
        self.backend = Some(backend.clone());
        Ok(backend)
    }

    /// Forget the verified binaries and look them up again
    pub fn recheck_ffmpeg(&mut self) {
        ffmpeg::backend::release();
        self.backend = None;
        self.status_message = match self.backend() {
            Ok(backend) => format!("Using {}", backend.version()),
            Err(e) => format!("{:#}", e),
        };
    }

    pub fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", VIDEO_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.open_file(path);
        }
    }

    pub fn open_file(&mut self, path: PathBuf) {
        match self.load_media(&path) {
            Ok(()) => {
                if let Some(media) = self.session.media() {
                    self.status_message = media.summary();
                }
            }
            Err(e) => {
                log::error!("failed to open {}: {:#}", path.display(), e);
                self.status_message = format!("Failed to open {}: {:#}", path.display(), e);
            }
        }
    }

    fn load_media(&mut self, path: &Path) -> Result<()> {
        let backend = self.backend()?;
        let info = ffmpeg::probe_file(&backend, path)?;
        if !info.has_video() {
            return Err(anyhow!("no video stream"));
        }
        let media = MediaFile::new(path.to_path_buf(), info);

        self.controller.pointer_cancel();
        self.player = Some(MediaPlayer::new(backend.clone(), &media));
        self.preview_texture = None;
        self.output_override = None;
        self.analysis = AnalysisState::Idle;
        let generation = self.session.load(media);

        self.start_sampling(backend, generation);
        Ok(())
    }

    fn start_sampling(&mut self, backend: Arc<FfmpegBackend>, generation: u64) {
        let Some(media) = self.session.media() else {
            return;
        };
        let path = media.path.clone();
        let duration = self.session.duration();
        let count = self.config.thumbnail_count;
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();

        self.sampling = true;
        self.runtime.spawn(async move {
            let result = ffmpeg::sample_frames(&backend, &path, duration, count)
                .await
                .map_err(|e| format!("{:#}", e));
            // The receiver only goes away with the app
            let _ = tx.send(AppEvent::Thumbnails { generation, result });
            ctx.request_repaint();
        });
    }

    pub fn close_media(&mut self) {
        self.controller.pointer_cancel();
        self.session.clear();
        self.player = None;
        self.preview_texture = None;
        self.output_override = None;
        self.analysis = AnalysisState::Idle;
        self.sampling = false;
        self.status_message = String::from("Ready");
    }

    fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Thumbnails { generation, result } => {
                    if !self.session.is_current(generation) {
                        log::debug!("dropping thumbnails for stale media #{}", generation);
                        continue;
                    }
                    self.sampling = false;
                    match result {
                        Ok(frames) => self.install_thumbnails(generation, frames),
                        Err(e) => {
                            log::warn!("thumbnail sampling failed: {}", e);
                            self.status_message = format!("Thumbnails unavailable: {}", e);
                        }
                    }
                }
                AppEvent::Analysis { generation, result } => {
                    if !self.session.is_current(generation) {
                        continue;
                    }
                    self.analysis = match result {
                        Ok(result) => AnalysisState::Done(result),
                        Err(e) => {
                            self.status_message = format!("Analysis failed: {}", e);
                            AnalysisState::Failed(e)
                        }
                    };
                }
            }
        }
    }

    fn install_thumbnails(&mut self, generation: u64, frames: Vec<SampledFrame>) {
        let mut thumbnails = Vec::with_capacity(frames.len());
        for (i, frame) in frames.into_iter().enumerate() {
            let name = format!("thumb_{}_{}", generation, i);
            match Thumbnail::load(&self.ctx, &name, frame.jpeg) {
                Ok(thumb) => thumbnails.push(FrameThumbnail::new(frame.timestamp, thumb)),
                Err(e) => log::warn!("thumbnail at {:.3}s: {:#}", frame.timestamp, e),
            }
        }
        self.session.set_thumbnails(generation, thumbnails);
    }

    pub fn apply_action(&mut self, action: TimelineAction) {
        if let Some(player) = self.player.as_mut() {
            self.session.apply(action, player);
        }
    }

    pub fn current_time(&self) -> f64 {
        self.player.as_ref().map(|p| p.current_time()).unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.player.as_ref().map(|p| p.is_playing()).unwrap_or(false)
    }

    pub fn toggle_play_pause(&mut self) {
        if let Some(player) = self.player.as_mut() {
            self.session.toggle_play(player);
        }
    }

    pub fn seek(&mut self, time: f64) {
        if let Some(player) = self.player.as_mut() {
            self.session.seek(time, player);
        }
    }

    pub fn seek_relative(&mut self, delta: f64) {
        let time = self.current_time() + delta;
        self.seek(time);
    }

    pub fn jump_to_trim_start(&mut self) {
        if let Some(range) = self.session.trim_range() {
            self.seek(range.start);
        }
    }

    pub fn jump_to_trim_end(&mut self) {
        if let Some(range) = self.session.trim_range() {
            self.seek(range.end);
        }
    }

    pub fn set_trim(&mut self, range: TimeRange) {
        if let Some(player) = self.player.as_mut() {
            self.session.set_trim(range, player);
        }
    }

    pub fn reset_trim(&mut self) {
        if let Some(player) = self.player.as_mut() {
            self.session.reset_trim(player);
        }
    }

    fn update_player(&mut self, ctx: &egui::Context) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.update();
        self.session.tick(player);

        if let Some(frame) = player.take_frame() {
            log::trace!("preview frame at {:.3}s", frame.pts);
            let image = frame_to_image(&frame);
            match &mut self.preview_texture {
                Some(texture) if texture.size() == image.size => {
                    texture.set(image, egui::TextureOptions::LINEAR)
                }
                _ => {
                    self.preview_texture =
                        Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR))
                }
            }
        }

        if player.is_playing() {
            ctx.request_repaint_after(std::time::Duration::from_millis(30));
        }
    }

    /// Export destination for the current range and mode
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.output_override {
            return Some(path.clone());
        }
        let media = self.session.media()?;
        let range = self.session.trim_range()?;
        Some(default_output_path(&media.path, range, self.trim_mode))
    }

    pub fn choose_output(&mut self) {
        let Some(suggested) = self.output_path() else {
            return;
        };
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = suggested.parent() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = suggested.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        if let Some(path) = dialog.save_file() {
            self.output_override = Some(path);
        }
    }

    pub fn start_export(&mut self) {
        let (Some(media), Some(range), Some(output)) = (
            self.session.media(),
            self.session.trim_range(),
            self.output_path(),
        ) else {
            self.status_message = "Nothing to export".to_string();
            return;
        };
        if output == media.path {
            self.status_message = "Refusing to overwrite the source file".to_string();
            return;
        }
        let input = media.path.clone();
        self.export_queue
            .lock()
            .add(input, output, range, self.trim_mode);
        // A fixed destination is used once; the next export gets a fresh name
        self.output_override = None;
        self.process_queue();
    }

    /// Start the next queued export if none is running
    fn process_queue(&mut self) {
        let Some(job) = self.export_queue.lock().start_next() else {
            return;
        };
        let backend = match self.backend() {
            Ok(backend) => backend,
            Err(e) => {
                self.export_queue.lock().finish(job.id, Err(format!("{:#}", e)));
                return;
            }
        };

        let queue = self.export_queue.clone();
        let ctx = self.ctx.clone();
        self.status_message = job.description();

        self.runtime.spawn(async move {
            let transcoder = Transcoder::new(backend);
            let result = transcoder
                .trim(&job.input, &job.output, job.range, job.mode, job.progress.clone())
                .await;

            match &result {
                Ok(()) => {
                    log::info!("exported {}", job.output.display());
                    job.progress.lock().complete();
                }
                Err(e) => {
                    log::error!("export of {} failed: {:#}", job.output.display(), e);
                    job.progress.lock().fail(&format!("{:#}", e));
                }
            }
            queue
                .lock()
                .finish(job.id, result.map_err(|e| format!("{:#}", e)));
            ctx.request_repaint();
        });
    }

    pub fn cancel_exports(&mut self) {
        self.export_queue.lock().cancel_pending();
        self.status_message = "Exports cancelled".to_string();
    }

    pub fn clear_finished_jobs(&mut self) {
        self.export_queue.lock().clear_finished();
    }

    /// Show the most recent export in the file manager
    pub fn reveal_last_export(&mut self) {
        let Some(path) = &self.last_export else {
            return;
        };
        let target = path.parent().unwrap_or(path);
        if let Err(e) = open::that(target) {
            self.status_message = format!("Cannot open {}: {}", target.display(), e);
        }
    }

    pub fn can_analyze(&self) -> bool {
        self.config.analysis_enabled()
            && !self.session.thumbnails().is_empty()
            && !matches!(self.analysis, AnalysisState::Running)
    }

    pub fn start_analysis(&mut self) {
        let Some(url) = self.config.analysis_url.clone() else {
            self.status_message = "No analysis service configured".to_string();
            return;
        };
        let thumbnails = self.session.thumbnails();
        let frames: Vec<AnalysisFrame> = pick_evenly(thumbnails.len(), self.config.analysis_frames)
            .into_iter()
            .map(|i| AnalysisFrame {
                timestamp: thumbnails[i].timestamp,
                jpeg: thumbnails[i].image.jpeg.to_vec(),
            })
            .collect();
        if frames.is_empty() {
            self.status_message = "No frames to analyze yet".to_string();
            return;
        }

        let mut client = AnalysisClient::new(url, self.config.analysis_api_key.clone());
        if let Some(prompt) = &self.config.analysis_prompt {
            client = client.with_prompt(prompt.clone());
        }
        let generation = self.session.generation();
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();

        self.analysis = AnalysisState::Running;
        self.runtime.spawn(async move {
            let result = client.analyze(&frames).await.map_err(|e| format!("{:#}", e));
            let _ = tx.send(AppEvent::Analysis { generation, result });
            ctx.request_repaint();
        });
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().find(|p| is_video_file(p)) {
            self.open_file(path);
        }

        if ctx.wants_keyboard_input() {
            return;
        }

        let (space, left, right, home, end, escape, open) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Home),
                i.key_pressed(egui::Key::End),
                i.key_pressed(egui::Key::Escape),
                i.modifiers.command && i.key_pressed(egui::Key::O),
            )
        });

        if escape {
            self.controller.pointer_cancel();
        }
        if space {
            self.toggle_play_pause();
        }
        if left {
            self.seek_relative(-SEEK_STEP);
        }
        if right {
            self.seek_relative(SEEK_STEP);
        }
        if home {
            self.jump_to_trim_start();
        }
        if end {
            self.jump_to_trim_end();
        }
        if open {
            self.open_dialog();
        }
    }

    /// Pick up finished exports for the status bar and the Reveal button
    fn update_export_status(&mut self) {
        let queue = self.export_queue.lock();
        if let Some(done) = queue
            .jobs
            .iter()
            .rev()
            .find(|j| j.status == JobStatus::Completed)
        {
            self.last_export = Some(done.output.clone());
        }
        let message = queue.status_message();
        if message.is_some() && message != self.last_queue_message {
            self.status_message = message.clone().unwrap_or_default();
        }
        self.last_queue_message = message;
    }
}

impl eframe::App for TrimmerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_input(ctx);
        self.poll_events();
        self.update_player(ctx);
        self.process_queue();
        self.update_export_status();

        crate::ui::render_main_window(self, ctx);

        if self.sampling || self.export_queue.lock().is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
