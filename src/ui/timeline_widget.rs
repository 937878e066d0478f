use crate::session::MediaSession;
use crate::timeline::{
    hit_test, HitTarget, PointerEvent, PointerKind, TimeAxis, TimelineAction, TimelineController,
    TimelineProjection, HANDLE_WIDTH, HOVER_POPUP_WIDTH, TRIM_BAR_HEIGHT,
};
use crate::ui::Thumbnail;
use eframe::egui;

const TIMELINE_HEIGHT: f32 = 84.0;

const TRIM_COLOR: egui::Color32 = egui::Color32::from_rgb(240, 190, 60);
const PLAYHEAD_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 60, 60);

/// Filmstrip timeline with scrubbing, hover preview and trim handles.
///
/// Pointer input is forwarded to the [`TimelineController`]; the proposed
/// mutations are returned for the owning session to apply.
pub struct TimelineWidget<'a> {
    session: &'a MediaSession<Thumbnail>,
    controller: &'a mut TimelineController,
    current_time: f64,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(
        session: &'a MediaSession<Thumbnail>,
        controller: &'a mut TimelineController,
        current_time: f64,
    ) -> Self {
        Self {
            session,
            controller,
            current_time,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) -> Vec<TimelineAction> {
        let mut actions = Vec::new();

        if self.session.duration() <= 0.0 {
            ui.label("No media loaded");
            return actions;
        }

        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), TIMELINE_HEIGHT),
            egui::Sense::click_and_drag(),
        );
        // Leave room for the handle tabs outside the range edges
        let axis_rect = rect.shrink2(egui::vec2(HANDLE_WIDTH, 0.0));
        let inputs = self.session.timeline_inputs(axis_rect);
        let Some(axis) = inputs.axis() else {
            return actions;
        };

        let (pressed, released, latest_pos, moved, touching, gone) = ui.input(|i| {
            let gone = i.events.iter().any(|e| {
                matches!(e, egui::Event::PointerGone | egui::Event::WindowFocused(false))
            });
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.pointer.is_moving(),
                i.any_touches(),
                gone,
            )
        });
        let kind = if touching { PointerKind::Touch } else { PointerKind::Mouse };
        let event = |pos: egui::Pos2| PointerEvent { pos, kind };

        if gone && self.controller.is_capturing() {
            self.controller.capture_lost();
        }

        if let Some(pos) = latest_pos {
            if pressed && response.hovered() {
                actions.extend(self.controller.pointer_down(&inputs, event(pos)));
            } else if moved && (self.controller.is_capturing() || rect.contains(pos)) {
                actions.extend(self.controller.pointer_move(&inputs, event(pos)));
            } else if !self.controller.is_capturing() && !rect.contains(pos) {
                self.controller.pointer_leave();
            }
            if released && self.controller.is_capturing() {
                actions.extend(self.controller.pointer_up(&inputs, event(pos)));
            }
        } else {
            self.controller.pointer_leave();
        }

        if let Some(pos) = response.hover_pos() {
            set_cursor(ui, self.controller, hit_test(&axis, pos, inputs.trim_range));
        }

        if self.controller.is_capturing() {
            ui.ctx().request_repaint();
        }

        if ui.is_rect_visible(rect) {
            // Draw the range the session will hold once pending changes apply
            let mut inputs = inputs;
            if let Some(range) = actions.iter().rev().find_map(|a| match a {
                TimelineAction::TrimChanged(range) => Some(*range),
                TimelineAction::Seek(_) => None,
            }) {
                inputs.trim_range = Some(range);
            }
            let projection = self.controller.project(&inputs, self.current_time);
            paint(ui, rect, &axis, &projection, self.session.thumbnails());
        }

        actions
    }
}

fn set_cursor(ui: &egui::Ui, controller: &TimelineController, target: HitTarget) {
    let icon = if controller.drag_session().is_some() {
        egui::CursorIcon::Grabbing
    } else if controller.is_scrubbing() {
        egui::CursorIcon::ResizeColumn
    } else {
        match target {
            HitTarget::TrimBody => egui::CursorIcon::Grab,
            HitTarget::StartHandle | HitTarget::EndHandle => egui::CursorIcon::ResizeHorizontal,
            HitTarget::Axis => egui::CursorIcon::PointingHand,
            HitTarget::Outside => return,
        }
    };
    ui.ctx().set_cursor_icon(icon);
}

fn paint(
    ui: &egui::Ui,
    rect: egui::Rect,
    axis: &TimeAxis,
    projection: &TimelineProjection,
    thumbnails: &[crate::timeline::FrameThumbnail<Thumbnail>],
) {
    let painter = ui.painter_at(rect);
    let axis_rect = axis.rect();
    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(30));

    // Filmstrip, below the grab bar
    let strip_top = axis_rect.top() + TRIM_BAR_HEIGHT;
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    for cell in &projection.cells {
        let Some(thumb) = thumbnails.get(cell.index) else {
            continue;
        };
        let left = axis.percent_to_x(cell.left_percent);
        let right = axis.percent_to_x(cell.left_percent + cell.width_percent);
        let cell_rect = egui::Rect::from_min_max(
            egui::pos2(left, strip_top),
            egui::pos2(right, axis_rect.bottom()),
        );
        painter.image(thumb.image.texture.id(), cell_rect, uv, egui::Color32::WHITE);
    }
    if projection.cells.is_empty() {
        painter.rect_filled(
            egui::Rect::from_min_max(egui::pos2(axis_rect.left(), strip_top), axis_rect.max),
            0.0,
            egui::Color32::from_gray(45),
        );
    }

    // Dim everything outside the trim range
    let start_x = axis.percent_to_x(projection.trim.left_percent);
    let end_x = axis.percent_to_x(projection.trim.left_percent + projection.trim.width_percent);
    let shade = egui::Color32::from_black_alpha(150);
    painter.rect_filled(
        egui::Rect::from_min_max(axis_rect.min, egui::pos2(start_x, axis_rect.bottom())),
        0.0,
        shade,
    );
    painter.rect_filled(
        egui::Rect::from_min_max(egui::pos2(end_x, axis_rect.top()), axis_rect.max),
        0.0,
        shade,
    );

    // Grab bar, outline and handles
    let bar = egui::Rect::from_min_max(
        egui::pos2(start_x, axis_rect.top()),
        egui::pos2(end_x, axis_rect.top() + TRIM_BAR_HEIGHT),
    );
    painter.rect_filled(bar, 2.0, TRIM_COLOR.gamma_multiply(0.8));
    painter.rect_stroke(
        egui::Rect::from_min_max(egui::pos2(start_x, axis_rect.top()), egui::pos2(end_x, axis_rect.bottom())),
        2.0,
        egui::Stroke::new(2.0, TRIM_COLOR),
    );
    for handle in [
        egui::Rect::from_min_max(
            egui::pos2(start_x - HANDLE_WIDTH, axis_rect.top()),
            egui::pos2(start_x, axis_rect.bottom()),
        ),
        egui::Rect::from_min_max(
            egui::pos2(end_x, axis_rect.top()),
            egui::pos2(end_x + HANDLE_WIDTH, axis_rect.bottom()),
        ),
    ] {
        painter.rect_filled(handle, 2.0, TRIM_COLOR);
        let grip_x = handle.center().x;
        painter.line_segment(
            [
                egui::pos2(grip_x, handle.center().y - 8.0),
                egui::pos2(grip_x, handle.center().y + 8.0),
            ],
            egui::Stroke::new(1.5, egui::Color32::from_gray(60)),
        );
    }

    // Playhead
    let playhead_x = axis.percent_to_x(projection.playhead_percent);
    painter.line_segment(
        [
            egui::pos2(playhead_x, rect.top()),
            egui::pos2(playhead_x, rect.bottom()),
        ],
        egui::Stroke::new(2.0, PLAYHEAD_COLOR),
    );

    if let Some(hover) = &projection.hover {
        let x = axis_rect.left() + hover.anchor_x;
        painter.line_segment(
            [egui::pos2(x, axis_rect.top()), egui::pos2(x, axis_rect.bottom())],
            egui::Stroke::new(1.0, egui::Color32::from_white_alpha(160)),
        );

        egui::Area::new(ui.id().with("timeline_hover"))
            .order(egui::Order::Tooltip)
            .pivot(egui::Align2::LEFT_BOTTOM)
            .fixed_pos(egui::pos2(axis_rect.left() + hover.left, rect.top() - 6.0))
            .interactable(false)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(HOVER_POPUP_WIDTH);
                    if let Some(thumb) = hover.frame.and_then(|i| thumbnails.get(i)) {
                        let size = thumb.image.texture.size_vec2();
                        let height = HOVER_POPUP_WIDTH * size.y / size.x.max(1.0);
                        ui.add(
                            egui::Image::new(&thumb.image.texture)
                                .fit_to_exact_size(egui::vec2(HOVER_POPUP_WIDTH, height)),
                        );
                    }
                    ui.vertical_centered(|ui| {
                        ui.monospace(&hover.label);
                    });
                });
            });
    }
}
