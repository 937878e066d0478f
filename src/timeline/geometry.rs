use eframe::egui;

/// Pixel <-> time mapping for the timeline axis.
///
/// Only constructible for a usable geometry: a positive, finite duration and a
/// positive axis width. Callers that get `None` back must skip whatever they
/// were about to do (no seek, no hover, no drag update), which covers the
/// window before media metadata has loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    rect: egui::Rect,
    duration: f64,
}

impl TimeAxis {
    pub fn new(rect: egui::Rect, duration: f64) -> Option<Self> {
        let width = rect.width();
        if !duration.is_finite() || duration <= 0.0 || !width.is_finite() || width <= 0.0 {
            return None;
        }
        Some(Self { rect, duration })
    }

    pub fn rect(&self) -> egui::Rect {
        self.rect
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn width(&self) -> f32 {
        self.rect.width()
    }

    /// Time under an absolute x coordinate, clamped to `[0, duration]`
    pub fn time_at(&self, x: f32) -> f64 {
        let local = (x - self.rect.left()).clamp(0.0, self.width());
        local as f64 / self.width() as f64 * self.duration
    }

    /// Absolute x coordinate of a time. Not clamped.
    pub fn x_at(&self, time: f64) -> f32 {
        self.rect.left() + (time / self.duration * self.width() as f64) as f32
    }

    /// Time covered by a horizontal pixel distance
    pub fn delta_time(&self, dx: f32) -> f64 {
        dx as f64 / self.width() as f64 * self.duration
    }

    pub fn percent_to_x(&self, percent: f64) -> f32 {
        self.rect.left() + (percent / 100.0 * self.width() as f64) as f32
    }
}

/// Position of `time` along the axis in percent, for layout
pub fn time_to_percent(time: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some(time / duration * 100.0)
}

/// `value.max(lo).min(hi)`; unlike `f64::clamp` this never panics when the
/// bounds cross, and the upper bound wins.
pub fn clamp_between(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
