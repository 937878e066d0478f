use super::geometry::{clamp_between, TimeAxis};
use serde::{Deserialize, Serialize};

/// Shortest trim range allowed, in seconds, for media longer than this
pub const MIN_TRIM_SPAN: f64 = 0.5;

pub fn min_span(duration: f64) -> f64 {
    MIN_TRIM_SPAN.min(duration.max(0.0))
}

/// Selected `[start, end)` interval, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn full(duration: f64) -> Self {
        Self::new(0.0, duration.max(0.0))
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn clamp_time(&self, time: f64) -> f64 {
        clamp_between(time, self.start, self.end)
    }

    /// Repair an arbitrary pair into a range valid for `duration`:
    /// ordered, inside `[0, duration]`, and at least `min_span` long.
    pub fn normalized(&self, duration: f64) -> Self {
        let duration = duration.max(0.0);
        let min = min_span(duration);
        let (a, b) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        let start = clamp_between(a, 0.0, duration - min);
        let end = clamp_between(b, start + min, duration);
        Self::new(start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift the whole range, keeping its span
    Move,
    AdjustStart,
    AdjustEnd,
}

/// State captured at pointer-down for one trim gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub mode: DragMode,
    pub pointer_origin_x: f32,
    pub origin_range: TimeRange,
}

impl DragSession {
    pub fn new(mode: DragMode, pointer_origin_x: f32, origin_range: TimeRange) -> Self {
        Self {
            mode,
            pointer_origin_x,
            origin_range,
        }
    }

    /// Range proposed for the pointer at `pointer_x`.
    ///
    /// Depends only on the snapshot taken at pointer-down and the current
    /// pointer position, so replaying an event yields the same range.
    pub fn resolve(&self, axis: &TimeAxis, pointer_x: f32) -> TimeRange {
        let duration = axis.duration();
        let min = min_span(duration);
        let origin = self.origin_range;

        match self.mode {
            DragMode::Move => {
                let span = origin.span();
                let delta = axis.delta_time(pointer_x - self.pointer_origin_x);
                let start = clamp_between(origin.start + delta, 0.0, duration - span);
                TimeRange::new(start, start + span)
            }
            DragMode::AdjustStart => {
                let time = axis.time_at(pointer_x);
                let start = clamp_between(time, 0.0, origin.end - min);
                TimeRange::new(start, origin.end)
            }
            DragMode::AdjustEnd => {
                let time = axis.time_at(pointer_x);
                let end = clamp_between(time, origin.start + min, duration);
                TimeRange::new(origin.start, end)
            }
        }
    }
}
