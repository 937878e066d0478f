//! The owning media session: authoritative duration, thumbnails and trim
//! range, and the reconciliation of the playback position with the range.

use crate::project::MediaFile;
use crate::timeline::{FrameThumbnail, TimeRange, TimelineAction, TimelineInputs};
use eframe::egui;

/// The media element being previewed
pub trait PlaybackSurface {
    fn duration(&self) -> f64;
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Jump to `time`; implementations clamp to `[0, duration]`
    fn seek(&mut self, time: f64);
}

/// Positions closer than this to the trim end count as "at the end"
const END_EPSILON: f64 = 0.01;

pub struct MediaSession<I> {
    media: Option<MediaFile>,
    duration: f64,
    thumbnails: Vec<FrameThumbnail<I>>,
    trim_range: Option<TimeRange>,
    /// Bumped on every load/clear so late collaborator results can be told apart
    generation: u64,
}

impl<I> MediaSession<I> {
    pub fn new() -> Self {
        Self {
            media: None,
            duration: 0.0,
            thumbnails: Vec::new(),
            trim_range: None,
            generation: 0,
        }
    }

    /// Replace the current media. Old thumbnails are released.
    pub fn load(&mut self, media: MediaFile) -> u64 {
        let duration = media.duration();
        self.clear();
        self.media = Some(media);
        self.on_duration_known(duration);
        self.generation
    }

    pub fn clear(&mut self) {
        self.media = None;
        self.duration = 0.0;
        self.thumbnails.clear();
        self.trim_range = None;
        self.generation += 1;
    }

    /// Metadata arrived: the trim range starts out covering everything
    pub fn on_duration_known(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
            self.trim_range = Some(TimeRange::full(duration));
        } else {
            self.duration = 0.0;
            self.trim_range = None;
        }
    }

    /// Install sampled thumbnails, unless they belong to an earlier media.
    pub fn set_thumbnails(&mut self, generation: u64, mut thumbnails: Vec<FrameThumbnail<I>>) -> bool {
        if generation != self.generation || self.media.is_none() {
            return false;
        }
        thumbnails.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        self.thumbnails = thumbnails;
        true
    }

    pub fn media(&self) -> Option<&MediaFile> {
        self.media.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn thumbnails(&self) -> &[FrameThumbnail<I>] {
        &self.thumbnails
    }

    pub fn trim_range(&self) -> Option<TimeRange> {
        self.trim_range
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn timeline_inputs(&self, axis_rect: egui::Rect) -> TimelineInputs<'_, I> {
        TimelineInputs {
            axis_rect,
            duration: self.duration,
            trim_range: self.trim_range,
            frames: &self.thumbnails,
        }
    }

    /// Apply a mutation proposed by the timeline controller
    pub fn apply(&mut self, action: TimelineAction, surface: &mut dyn PlaybackSurface) {
        match action {
            TimelineAction::Seek(time) => self.seek(time, surface),
            TimelineAction::TrimChanged(range) => self.apply_trim(range, surface),
        }
    }

    pub fn seek(&self, time: f64, surface: &mut dyn PlaybackSurface) {
        if self.media.is_none() {
            return;
        }
        surface.seek(time.clamp(0.0, self.duration));
    }

    /// Replace the trim range (last writer wins), then reconcile the
    /// playback position with it.
    pub fn apply_trim(&mut self, range: TimeRange, surface: &mut dyn PlaybackSurface) {
        if self.media.is_none() || self.duration <= 0.0 {
            return;
        }
        self.trim_range = Some(range);
        self.reconcile(surface);
    }

    /// Programmatic trim edit; the pair is repaired into a valid range first.
    pub fn set_trim(&mut self, range: TimeRange, surface: &mut dyn PlaybackSurface) {
        let range = range.normalized(self.duration);
        self.apply_trim(range, surface);
    }

    pub fn reset_trim(&mut self, surface: &mut dyn PlaybackSurface) {
        self.apply_trim(TimeRange::full(self.duration), surface);
    }

    /// Keep the playback position inside the trim range. Playback that is
    /// pushed out of the range is paused.
    pub fn reconcile(&self, surface: &mut dyn PlaybackSurface) {
        let Some(range) = self.trim_range else {
            return;
        };
        let time = surface.current_time();
        if range.contains(time) {
            return;
        }
        if surface.is_playing() {
            surface.pause();
        }
        surface.seek(range.clamp_time(time));
    }

    /// Per-frame check while playing: stop at the trim end.
    pub fn tick(&self, surface: &mut dyn PlaybackSurface) {
        let Some(range) = self.trim_range else {
            return;
        };
        if surface.is_playing() && surface.current_time() >= range.end {
            surface.pause();
            surface.seek(range.end);
        }
    }

    /// Start playback inside the trim range, rewinding to its start when the
    /// position is at its end or outside it.
    pub fn play(&self, surface: &mut dyn PlaybackSurface) {
        if self.media.is_none() {
            return;
        }
        if let Some(range) = self.trim_range {
            let time = surface.current_time();
            if time < range.start || time >= range.end - END_EPSILON {
                surface.seek(range.start);
            }
        }
        surface.play();
    }

    pub fn toggle_play(&self, surface: &mut dyn PlaybackSurface) {
        if surface.is_playing() {
            surface.pause();
        } else {
            self.play(surface);
        }
    }
}

impl<I> Default for MediaSession<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::MediaInfo;
    use std::path::PathBuf;

    /// In-memory playback surface recording what the session asked of it
    #[derive(Debug, Default)]
    struct FakeSurface {
        duration: f64,
        time: f64,
        playing: bool,
        seeks: Vec<f64>,
        pauses: usize,
    }

    impl FakeSurface {
        fn new(duration: f64) -> Self {
            Self {
                duration,
                ..Default::default()
            }
        }
    }

    impl PlaybackSurface for FakeSurface {
        fn duration(&self) -> f64 {
            self.duration
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
            self.pauses += 1;
        }
        fn seek(&mut self, time: f64) {
            self.time = time.clamp(0.0, self.duration);
            self.seeks.push(self.time);
        }
    }

    fn media(duration: f64) -> MediaFile {
        MediaFile::new(
            PathBuf::from("clip.mp4"),
            MediaInfo {
                duration,
                ..Default::default()
            },
        )
    }

    fn loaded(duration: f64) -> MediaSession<u32> {
        let mut session = MediaSession::new();
        session.load(media(duration));
        session
    }

    #[test]
    fn test_load_initializes_full_range() {
        let session = loaded(12.0);
        assert_eq!(session.trim_range(), Some(TimeRange::new(0.0, 12.0)));
        assert_eq!(session.duration(), 12.0);
    }

    #[test]
    fn test_zero_duration_has_no_range() {
        let session = loaded(0.0);
        assert_eq!(session.trim_range(), None);
    }

    #[test]
    fn test_narrowing_trim_clamps_paused_position() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        surface.time = 1.0;

        session.apply_trim(TimeRange::new(2.0, 5.0), &mut surface);
        assert_eq!(surface.time, 2.0);
        assert_eq!(surface.pauses, 0);
    }

    #[test]
    fn test_narrowing_trim_pauses_playback_outside_range() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        surface.time = 7.0;
        surface.playing = true;

        session.apply_trim(TimeRange::new(2.0, 5.0), &mut surface);
        assert!(!surface.playing);
        assert_eq!(surface.time, 5.0);
    }

    #[test]
    fn test_trim_containing_position_leaves_playback_alone() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        surface.time = 3.0;
        surface.playing = true;

        session.apply_trim(TimeRange::new(2.0, 5.0), &mut surface);
        assert!(surface.playing);
        assert!(surface.seeks.is_empty());
    }

    #[test]
    fn test_last_trim_wins() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        session.apply(TimelineAction::TrimChanged(TimeRange::new(1.0, 4.0)), &mut surface);
        session.apply(TimelineAction::TrimChanged(TimeRange::new(3.0, 6.0)), &mut surface);
        assert_eq!(session.trim_range(), Some(TimeRange::new(3.0, 6.0)));
    }

    #[test]
    fn test_seek_action_is_clamped_to_media() {
        let session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        session.seek(42.0, &mut surface);
        assert_eq!(surface.seeks, vec![10.0]);
    }

    #[test]
    fn test_no_media_ignores_everything() {
        let mut session: MediaSession<u32> = MediaSession::new();
        let mut surface = FakeSurface::new(10.0);
        session.apply(TimelineAction::Seek(3.0), &mut surface);
        session.apply(TimelineAction::TrimChanged(TimeRange::new(1.0, 2.0)), &mut surface);
        assert!(surface.seeks.is_empty());
        assert_eq!(session.trim_range(), None);
    }

    #[test]
    fn test_stale_thumbnails_are_discarded() {
        let mut session = loaded(10.0);
        let old_generation = session.generation();
        let new_generation = session.load(media(20.0));
        assert!(!session.set_thumbnails(old_generation, vec![FrameThumbnail::new(1.0, 1)]));
        assert!(session.thumbnails().is_empty());

        let accepted = session.set_thumbnails(
            new_generation,
            vec![FrameThumbnail::new(6.0, 2), FrameThumbnail::new(2.0, 1)],
        );
        assert!(accepted);
        assert_eq!(session.thumbnails()[0].timestamp, 2.0);
    }

    #[test]
    fn test_clear_releases_state() {
        let mut session = loaded(10.0);
        let generation = session.generation();
        session.set_thumbnails(generation, vec![FrameThumbnail::new(1.0, 1)]);
        session.clear();
        assert!(session.media().is_none());
        assert!(session.thumbnails().is_empty());
        assert_eq!(session.trim_range(), None);
        assert!(!session.is_current(generation));
    }

    #[test]
    fn test_tick_stops_at_trim_end() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        session.apply_trim(TimeRange::new(0.0, 4.0), &mut surface);
        surface.playing = true;
        surface.time = 4.2;
        session.tick(&mut surface);
        assert!(!surface.playing);
        assert_eq!(surface.time, 4.0);
    }

    #[test]
    fn test_play_rewinds_from_range_end() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        session.apply_trim(TimeRange::new(2.0, 4.0), &mut surface);
        surface.time = 4.0;
        session.play(&mut surface);
        assert!(surface.playing);
        assert_eq!(surface.time, 2.0);

        session.toggle_play(&mut surface);
        assert!(!surface.playing);
    }

    #[test]
    fn test_set_trim_repairs_input() {
        let mut session = loaded(10.0);
        let mut surface = FakeSurface::new(10.0);
        session.set_trim(TimeRange::new(8.0, 3.0), &mut surface);
        assert_eq!(session.trim_range(), Some(TimeRange::new(3.0, 8.0)));
        session.reset_trim(&mut surface);
        assert_eq!(session.trim_range(), Some(TimeRange::full(10.0)));
    }
}
