use super::controller::{HoverState, TimelineController, TimelineInputs};
use super::geometry::{clamp_between, time_to_percent};
use crate::utils::format_time;

/// Width of the hover preview popup, in pixels
pub const HOVER_POPUP_WIDTH: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimOverlay {
    pub left_percent: f64,
    pub width_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmstripCell {
    pub index: usize,
    pub left_percent: f64,
    pub width_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverPopup {
    /// Left edge of the popup relative to the axis, kept inside the axis
    pub left: f32,
    /// Pointer position relative to the axis
    pub anchor_x: f32,
    pub time: f64,
    pub label: String,
    pub frame: Option<usize>,
}

/// Layout of everything drawn on the timeline, in axis-relative units
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineProjection {
    pub playhead_percent: f64,
    pub trim: TrimOverlay,
    pub cells: Vec<FilmstripCell>,
    pub hover: Option<HoverPopup>,
}

pub fn project<I>(
    inputs: &TimelineInputs<'_, I>,
    current_time: f64,
    hover: Option<&HoverState>,
) -> TimelineProjection {
    let duration = inputs.duration;

    let playhead_percent = time_to_percent(clamp_between(current_time, 0.0, duration), duration)
        .unwrap_or(0.0);

    let trim = inputs
        .trim_range
        .and_then(|range| {
            Some(TrimOverlay {
                left_percent: time_to_percent(range.start, duration)?,
                width_percent: time_to_percent(range.span().max(0.0), duration)?,
            })
        })
        .unwrap_or_default();

    let count = inputs.frames.len();
    let cells = (0..count)
        .map(|index| {
            let width_percent = 100.0 / count as f64;
            FilmstripCell {
                index,
                left_percent: index as f64 * width_percent,
                width_percent,
            }
        })
        .collect();

    let hover = match (hover, inputs.axis()) {
        (Some(hover), Some(axis)) => {
            let max_left = (axis.width() - HOVER_POPUP_WIDTH).max(0.0);
            Some(HoverPopup {
                left: (hover.pixel_x - HOVER_POPUP_WIDTH / 2.0).clamp(0.0, max_left),
                anchor_x: hover.pixel_x,
                time: hover.time,
                label: format_time(hover.time),
                frame: hover.frame,
            })
        }
        _ => None,
    };

    TimelineProjection {
        playhead_percent,
        trim,
        cells,
        hover,
    }
}

impl TimelineController {
    pub fn project<I>(&self, inputs: &TimelineInputs<'_, I>, current_time: f64) -> TimelineProjection {
        project(inputs, current_time, self.hover())
    }
}
