use super::frames::{nearest_frame, FrameThumbnail};
use super::geometry::TimeAxis;
use super::trim::{DragMode, DragSession, TimeRange};
use eframe::egui;

/// Height of the grab bar along the top of the axis that moves the whole range
pub const TRIM_BAR_HEIGHT: f32 = 14.0;
/// Width of the start/end handle tabs, placed just outside the range edges
pub const HANDLE_WIDTH: f32 = 10.0;

/// What a pointer-down landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    TrimBody,
    StartHandle,
    EndHandle,
    /// Plain axis: scrubbing
    Axis,
    Outside,
}

impl HitTarget {
    pub fn drag_mode(self) -> Option<DragMode> {
        match self {
            HitTarget::TrimBody => Some(DragMode::Move),
            HitTarget::StartHandle => Some(DragMode::AdjustStart),
            HitTarget::EndHandle => Some(DragMode::AdjustEnd),
            HitTarget::Axis | HitTarget::Outside => None,
        }
    }
}

/// Classify `pos` against the trim targets (body, start handle, end handle, in
/// that order) and then the axis itself.
pub fn hit_test(axis: &TimeAxis, pos: egui::Pos2, range: Option<TimeRange>) -> HitTarget {
    let rect = axis.rect();
    if pos.y < rect.top() || pos.y > rect.bottom() {
        return HitTarget::Outside;
    }

    if let Some(range) = range {
        let start_x = axis.x_at(range.start);
        let end_x = axis.x_at(range.end);

        if pos.y <= rect.top() + TRIM_BAR_HEIGHT && pos.x >= start_x && pos.x <= end_x {
            return HitTarget::TrimBody;
        }
        if pos.x >= start_x - HANDLE_WIDTH && pos.x < start_x {
            return HitTarget::StartHandle;
        }
        if pos.x > end_x && pos.x <= end_x + HANDLE_WIDTH {
            return HitTarget::EndHandle;
        }
    }

    if pos.x >= rect.left() && pos.x <= rect.right() {
        HitTarget::Axis
    } else {
        HitTarget::Outside
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    /// Only mouse-class pointers get the hover preview
    pub fn shows_hover(self) -> bool {
        self == PointerKind::Mouse
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pos: egui::Pos2,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn mouse(pos: egui::Pos2) -> Self {
        Self {
            pos,
            kind: PointerKind::Mouse,
        }
    }

    pub fn touch(pos: egui::Pos2) -> Self {
        Self {
            pos,
            kind: PointerKind::Touch,
        }
    }
}

/// Mutation proposed to the owning session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineAction {
    Seek(f64),
    TrimChanged(TimeRange),
}

/// Everything the controller reads but does not own
pub struct TimelineInputs<'a, I> {
    pub axis_rect: egui::Rect,
    pub duration: f64,
    pub trim_range: Option<TimeRange>,
    pub frames: &'a [FrameThumbnail<I>],
}

impl<'a, I> TimelineInputs<'a, I> {
    pub fn axis(&self) -> Option<TimeAxis> {
        TimeAxis::new(self.axis_rect, self.duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverState {
    /// Offset from the axis' left edge
    pub pixel_x: f32,
    pub time: f64,
    /// Index into the thumbnail sequence
    pub frame: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Scrubbing,
    Trimming(DragSession),
}

/// Pointer state machine for the timeline axis.
///
/// Holds only the state of the gesture in progress and the hover preview.
/// Every handler returns the mutation to apply, if any; the caller owns the
/// duration, the trim range and the thumbnails.
#[derive(Debug, Default)]
pub struct TimelineController {
    gesture: Gesture,
    hover: Option<HoverState>,
}

impl TimelineController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover(&self) -> Option<&HoverState> {
        self.hover.as_ref()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.gesture == Gesture::Scrubbing
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        match &self.gesture {
            Gesture::Trimming(session) => Some(session),
            _ => None,
        }
    }

    /// True while a gesture holds pointer capture
    pub fn is_capturing(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn pointer_down<I>(
        &mut self,
        inputs: &TimelineInputs<'_, I>,
        event: PointerEvent,
    ) -> Option<TimelineAction> {
        if self.is_capturing() {
            return None;
        }
        let axis = inputs.axis()?;

        let target = hit_test(&axis, event.pos, inputs.trim_range);
        match (target.drag_mode(), inputs.trim_range) {
            (Some(mode), Some(range)) => {
                log::debug!("trim drag {:?} from {:.3}-{:.3}", mode, range.start, range.end);
                self.gesture = Gesture::Trimming(DragSession::new(mode, event.pos.x, range));
                self.hover = None;
                None
            }
            _ if target == HitTarget::Axis => {
                self.gesture = Gesture::Scrubbing;
                if event.kind.shows_hover() {
                    self.update_hover(&axis, inputs.frames, event.pos.x);
                }
                Some(TimelineAction::Seek(axis.time_at(event.pos.x)))
            }
            _ => None,
        }
    }

    pub fn pointer_move<I>(
        &mut self,
        inputs: &TimelineInputs<'_, I>,
        event: PointerEvent,
    ) -> Option<TimelineAction> {
        let axis = inputs.axis()?;

        match self.gesture {
            Gesture::Trimming(session) => Some(TimelineAction::TrimChanged(
                session.resolve(&axis, event.pos.x),
            )),
            Gesture::Scrubbing => {
                if event.kind.shows_hover() {
                    self.update_hover(&axis, inputs.frames, event.pos.x);
                }
                Some(TimelineAction::Seek(axis.time_at(event.pos.x)))
            }
            Gesture::Idle => {
                if event.kind.shows_hover() {
                    if axis.rect().contains(event.pos) {
                        self.update_hover(&axis, inputs.frames, event.pos.x);
                    } else {
                        self.hover = None;
                    }
                }
                None
            }
        }
    }

    /// Ends the gesture. No seek is issued on release.
    pub fn pointer_up<I>(
        &mut self,
        inputs: &TimelineInputs<'_, I>,
        event: PointerEvent,
    ) -> Option<TimelineAction> {
        self.gesture = Gesture::Idle;
        if !inputs.axis_rect.contains(event.pos) {
            self.hover = None;
        }
        None
    }

    /// Abort the gesture: nothing further is emitted and the preview is dropped.
    pub fn pointer_cancel(&mut self) -> Option<TimelineAction> {
        if self.gesture != Gesture::Idle {
            log::debug!("timeline gesture cancelled");
        }
        self.gesture = Gesture::Idle;
        self.hover = None;
        None
    }

    /// Pointer capture was taken away; same as a cancel.
    pub fn capture_lost(&mut self) -> Option<TimelineAction> {
        self.pointer_cancel()
    }

    pub fn pointer_leave(&mut self) {
        if self.gesture != Gesture::Scrubbing {
            self.hover = None;
        }
    }

    fn update_hover<I>(&mut self, axis: &TimeAxis, frames: &[FrameThumbnail<I>], x: f32) {
        let time = axis.time_at(x);
        self.hover = Some(HoverState {
            pixel_x: (x - axis.rect().left()).clamp(0.0, axis.width()),
            time,
            frame: nearest_frame(frames, time),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Axis from x=100 to x=1100 (100px per second over 10s), y 0..80
    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(100.0, 0.0), egui::vec2(1000.0, 80.0))
    }

    fn frames() -> Vec<FrameThumbnail<u32>> {
        [0.0, 2.0, 4.0, 6.0, 8.0]
            .iter()
            .enumerate()
            .map(|(i, &t)| FrameThumbnail::new(t, i as u32))
            .collect()
    }

    fn inputs<'a>(
        range: Option<TimeRange>,
        frames: &'a [FrameThumbnail<u32>],
    ) -> TimelineInputs<'a, u32> {
        TimelineInputs {
            axis_rect: rect(),
            duration: 10.0,
            trim_range: range,
            frames,
        }
    }

    fn time_x(t: f64) -> f32 {
        100.0 + t as f32 * 100.0
    }

    fn seek_of(action: Option<TimelineAction>) -> f64 {
        match action {
            Some(TimelineAction::Seek(time)) => time,
            other => panic!("expected seek, got {:?}", other),
        }
    }

    fn trim_of(action: Option<TimelineAction>) -> TimeRange {
        match action {
            Some(TimelineAction::TrimChanged(range)) => range,
            other => panic!("expected trim change, got {:?}", other),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_hit_test_priority() {
        let axis = TimeAxis::new(rect(), 10.0).unwrap();
        let range = Some(TimeRange::new(2.0, 5.0));
        assert_eq!(hit_test(&axis, egui::pos2(time_x(3.0), 5.0), range), HitTarget::TrimBody);
        // Below the grab bar the range area scrubs
        assert_eq!(hit_test(&axis, egui::pos2(time_x(3.0), 50.0), range), HitTarget::Axis);
        assert_eq!(hit_test(&axis, egui::pos2(time_x(2.0) - 4.0, 50.0), range), HitTarget::StartHandle);
        assert_eq!(hit_test(&axis, egui::pos2(time_x(5.0) + 4.0, 50.0), range), HitTarget::EndHandle);
        // The edge itself belongs to the body in the grab bar
        assert_eq!(hit_test(&axis, egui::pos2(time_x(2.0), 5.0), range), HitTarget::TrimBody);
        assert_eq!(hit_test(&axis, egui::pos2(time_x(3.0), 200.0), range), HitTarget::Outside);
        assert_eq!(hit_test(&axis, egui::pos2(time_x(3.0), 5.0), None), HitTarget::Axis);
    }

    #[test]
    fn test_handle_outside_axis_at_zero() {
        let axis = TimeAxis::new(rect(), 10.0).unwrap();
        let range = Some(TimeRange::new(0.0, 10.0));
        assert_eq!(hit_test(&axis, egui::pos2(95.0, 40.0), range), HitTarget::StartHandle);
        assert_eq!(hit_test(&axis, egui::pos2(1105.0, 40.0), range), HitTarget::EndHandle);
        assert_eq!(hit_test(&axis, egui::pos2(80.0, 40.0), range), HitTarget::Outside);
    }

    #[test]
    fn test_scrub_seeks_on_down_and_move_only() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();

        let down = controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(7.0), 40.0)));
        assert!(close(seek_of(down), 7.0));
        assert!(controller.is_scrubbing());

        let moved = controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(8.5), 40.0)));
        assert!(close(seek_of(moved), 8.5));

        let up = controller.pointer_up(&inputs, PointerEvent::mouse(egui::pos2(time_x(8.5), 40.0)));
        assert_eq!(up, None);
        assert!(!controller.is_capturing());
    }

    #[test]
    fn test_scrub_move_outside_clamps() {
        let frames = frames();
        let inputs = inputs(None, &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(1.0), 40.0)));
        let moved = controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(5000.0, 400.0)));
        assert!(close(seek_of(moved), 10.0));
    }

    #[test]
    fn test_body_without_range_falls_through_to_scrub() {
        let frames = frames();
        let inputs = inputs(None, &frames);
        let mut controller = TimelineController::new();
        let action = controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 5.0)));
        assert!(close(seek_of(action), 3.0));
        assert!(controller.is_scrubbing());
        assert!(controller.drag_session().is_none());
    }

    #[test]
    fn test_trim_body_does_not_seek() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        let action = controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 5.0)));
        assert_eq!(action, None);
        assert!(!controller.is_scrubbing());
        let session = controller.drag_session().unwrap();
        assert_eq!(session.mode, DragMode::Move);
        assert_eq!(session.origin_range, TimeRange::new(2.0, 5.0));
        assert_eq!(session.pointer_origin_x, time_x(3.0));
    }

    #[test]
    fn test_move_drag_emits_every_update() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 5.0)));

        let first = trim_of(controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(7.0), 5.0))));
        assert!(close(first.start, 6.0) && close(first.end, 9.0));

        // Origin is the snapshot, not the last emitted range
        let second = trim_of(controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(13.0), 5.0))));
        assert!(close(second.start, 7.0) && close(second.end, 10.0));
    }

    #[test]
    fn test_same_move_event_twice_is_idempotent() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(5.0) + 5.0, 40.0)));
        let event = PointerEvent::mouse(egui::pos2(time_x(6.3), 40.0));
        let a = controller.pointer_move(&inputs, event);
        let b = controller.pointer_move(&inputs, event);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_start_handle_drag_clamps_to_min_span() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(2.0) - 3.0, 40.0)));
        assert_eq!(controller.drag_session().map(|s| s.mode), Some(DragMode::AdjustStart));
        let range = trim_of(controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(4.8), 40.0))));
        assert!(close(range.start, 4.5));
        assert_eq!(range.end, 5.0);
    }

    #[test]
    fn test_cancel_mid_drag_stops_emitting() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(5.0) + 3.0, 40.0)));
        assert!(controller
            .pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(6.0), 40.0)))
            .is_some());

        assert_eq!(controller.pointer_cancel(), None);
        assert!(controller.drag_session().is_none());
        assert!(!controller.is_capturing());
        assert!(controller.hover().is_none());

        // Stray move after cancel only updates hover
        let stray = controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(7.0), 40.0)));
        assert_eq!(stray, None);
    }

    #[test]
    fn test_capture_lost_resets_scrub() {
        let frames = frames();
        let inputs = inputs(None, &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(1.0), 40.0)));
        assert!(controller.hover().is_some());
        controller.capture_lost();
        assert!(!controller.is_capturing());
        assert!(controller.hover().is_none());
    }

    #[test]
    fn test_second_pointer_down_is_ignored() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_down(&inputs, PointerEvent::touch(egui::pos2(time_x(3.0), 5.0)));
        let again = controller.pointer_down(&inputs, PointerEvent::touch(egui::pos2(time_x(8.0), 40.0)));
        assert_eq!(again, None);
        assert_eq!(controller.drag_session().map(|s| s.mode), Some(DragMode::Move));
    }

    #[test]
    fn test_hover_mouse_only() {
        let frames = frames();
        let inputs = inputs(None, &frames);
        let mut controller = TimelineController::new();

        controller.pointer_move(&inputs, PointerEvent::touch(egui::pos2(time_x(3.0), 40.0)));
        assert!(controller.hover().is_none());

        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(2.5), 40.0)));
        let hover = controller.hover().copied().unwrap();
        assert!(close(hover.time, 2.5));
        assert_eq!(hover.pixel_x, 250.0);
        assert_eq!(hover.frame, Some(1));

        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(7.5), 40.0)));
        assert_eq!(controller.hover().and_then(|h| h.frame), Some(4));
    }

    #[test]
    fn test_hover_without_frames() {
        let empty: Vec<FrameThumbnail<u32>> = Vec::new();
        let inputs = inputs(None, &empty);
        let mut controller = TimelineController::new();
        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 40.0)));
        assert_eq!(controller.hover().and_then(|h| h.frame), None);
        assert!(controller.hover().is_some());
    }

    #[test]
    fn test_hover_cleared_on_leave_unless_scrubbing() {
        let frames = frames();
        let inputs = inputs(None, &frames);
        let mut controller = TimelineController::new();

        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 40.0)));
        controller.pointer_leave();
        assert!(controller.hover().is_none());

        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 40.0)));
        controller.pointer_leave();
        assert!(controller.hover().is_some());

        // Released outside the axis: the preview goes away
        controller.pointer_up(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 300.0)));
        assert!(controller.hover().is_none());
    }

    #[test]
    fn test_trim_drag_suppresses_hover() {
        let frames = frames();
        let inputs = inputs(Some(TimeRange::new(2.0, 5.0)), &frames);
        let mut controller = TimelineController::new();
        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 5.0)));
        assert!(controller.hover().is_some());
        controller.pointer_down(&inputs, PointerEvent::mouse(egui::pos2(time_x(3.0), 5.0)));
        assert!(controller.hover().is_none());
        controller.pointer_move(&inputs, PointerEvent::mouse(egui::pos2(time_x(4.0), 5.0)));
        assert!(controller.hover().is_none());
    }

    #[test]
    fn test_degenerate_geometry_is_noop() {
        let frames = frames();
        let mut zero_duration = inputs(Some(TimeRange::new(0.0, 0.0)), &frames);
        zero_duration.duration = 0.0;
        let mut controller = TimelineController::new();
        assert_eq!(
            controller.pointer_down(&zero_duration, PointerEvent::mouse(egui::pos2(time_x(3.0), 40.0))),
            None
        );
        assert!(!controller.is_capturing());
        assert_eq!(
            controller.pointer_move(&zero_duration, PointerEvent::mouse(egui::pos2(time_x(3.0), 40.0))),
            None
        );
        assert!(controller.hover().is_none());

        let mut zero_width = inputs(None, &frames);
        zero_width.axis_rect = egui::Rect::from_min_size(egui::pos2(100.0, 0.0), egui::vec2(0.0, 80.0));
        assert_eq!(
            controller.pointer_down(&zero_width, PointerEvent::mouse(egui::pos2(100.0, 40.0))),
            None
        );
    }
}
