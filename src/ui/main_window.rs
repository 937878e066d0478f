use crate::app::{AnalysisState, TrimmerApp, SEEK_STEP};
use crate::export::JobStatus;
use crate::ffmpeg::TrimMode;
use crate::timeline::{min_span, TimeRange};
use crate::ui::{fit_size, TimelineWidget};
use crate::utils::format_time;
use eframe::egui;

pub fn render_main_window(app: &mut TrimmerApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        render_menu_bar(app, ui);
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        render_status_bar(app, ui);
    });

    egui::TopBottomPanel::bottom("export_bar").show(ctx, |ui| {
        render_export_bar(app, ui);
    });

    egui::TopBottomPanel::bottom("timeline_panel")
        .resizable(false)
        .show(ctx, |ui| {
            render_timeline_panel(app, ui);
        });

    if app.config.analysis_enabled() {
        egui::SidePanel::right("analysis_panel")
            .resizable(true)
            .default_width(260.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                render_analysis_panel(app, ui);
            });
    }

    egui::CentralPanel::default().show(ctx, |ui| {
        let controls_height = 36.0;
        let preview_height = (ui.available_height() - controls_height).max(120.0);
        render_preview_area(app, ui, preview_height);

        ui.separator();

        render_playback_controls(app, ui);
    });
}

fn render_menu_bar(app: &mut TrimmerApp, ui: &mut egui::Ui) {
    egui::menu::bar(ui, |ui| {
        ui.menu_button("File", |ui| {
            if ui.button("Open Video... (Ctrl+O)").clicked() {
                ui.close_menu();
                app.open_dialog();
            }
            let has_media = app.session.media().is_some();
            if ui.add_enabled(has_media, egui::Button::new("Close")).clicked() {
                app.close_media();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.menu_button("Playback", |ui| {
            if ui.button("Play/Pause (Space)").clicked() {
                app.toggle_play_pause();
                ui.close_menu();
            }
            if ui.button("Go to Trim Start (Home)").clicked() {
                app.jump_to_trim_start();
                ui.close_menu();
            }
            if ui.button("Go to Trim End (End)").clicked() {
                app.jump_to_trim_end();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Reset Trim").clicked() {
                app.reset_trim();
                ui.close_menu();
            }
        });

        ui.menu_button("Tools", |ui| {
            let has_media = app.session.media().is_some();
            if ui
                .add_enabled(has_media, egui::Button::new("Open in Default Player"))
                .clicked()
            {
                if let Some(media) = app.session.media() {
                    if let Err(e) = open::that(&media.path) {
                        app.status_message = format!("Cannot open player: {}", e);
                    }
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(app.can_analyze(), egui::Button::new("Analyze Frames"))
                .clicked()
            {
                app.start_analysis();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Re-check FFmpeg").clicked() {
                app.recheck_ffmpeg();
                ui.close_menu();
            }
        });
    });
}

fn render_status_bar(app: &TrimmerApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.label(&app.status_message);

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if app.sampling {
                ui.spinner();
                ui.label("Sampling thumbnails...");
            } else if let Some(media) = app.session.media() {
                ui.label(format!("{} thumbnail(s)", app.session.thumbnails().len()));
                ui.separator();
                ui.label(media.resolution_string());
            }
        });
    });
}

fn render_preview_area(app: &TrimmerApp, ui: &mut egui::Ui, height: f32) {
    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_height(height);
        ui.set_max_height(height);

        if let Some(ref texture) = app.preview_texture {
            let display_size = fit_size(texture.size_vec2(), ui.available_size());
            ui.centered_and_justified(|ui| {
                ui.image((texture.id(), display_size));
            });
        } else if let Some(media) = app.session.media() {
            ui.centered_and_justified(|ui| {
                ui.label(format!("{}\n\nLoading preview...", media.summary()));
            });
        } else {
            ui.centered_and_justified(|ui| {
                ui.label("No video loaded\nDrag & drop or File > Open Video...");
            });
        }
    });
}

fn render_playback_controls(app: &mut TrimmerApp, ui: &mut egui::Ui) {
    let has_media = app.player.is_some();
    ui.add_enabled_ui(has_media, |ui| {
        ui.horizontal(|ui| {
            if ui.button("|<").on_hover_text("Trim start (Home)").clicked() {
                app.jump_to_trim_start();
            }
            if ui.button("<<").on_hover_text("Back 5s (Left)").clicked() {
                app.seek_relative(-SEEK_STEP);
            }
            let play_pause_text = if app.is_playing() { "||" } else { ">" };
            if ui.button(play_pause_text).on_hover_text("Play/Pause (Space)").clicked() {
                app.toggle_play_pause();
            }
            if ui.button(">>").on_hover_text("Forward 5s (Right)").clicked() {
                app.seek_relative(SEEK_STEP);
            }
            if ui.button(">|").on_hover_text("Trim end (End)").clicked() {
                app.jump_to_trim_end();
            }

            ui.separator();

            ui.monospace(format!(
                "{} / {}",
                format_time(app.current_time()),
                format_time(app.session.duration())
            ));
        });
    });
}

fn render_timeline_panel(app: &mut TrimmerApp, ui: &mut egui::Ui) {
    ui.add_space(4.0);
    let current_time = app.current_time();
    let actions = TimelineWidget::new(&app.session, &mut app.controller, current_time).show(ui);
    for action in actions {
        app.apply_action(action);
    }

    let Some(range) = app.session.trim_range() else {
        return;
    };
    let duration = app.session.duration();
    let min = min_span(duration);

    ui.horizontal(|ui| {
        let mut start = range.start;
        let mut end = range.end;

        ui.label("Trim:");
        let start_changed = ui
            .add(
                egui::DragValue::new(&mut start)
                    .range(0.0..=(range.end - min).max(0.0))
                    .speed(0.05)
                    .custom_formatter(|v, _| format_time(v)),
            )
            .changed();
        ui.label("-");
        let end_changed = ui
            .add(
                egui::DragValue::new(&mut end)
                    .range((range.start + min).min(duration)..=duration)
                    .speed(0.05)
                    .custom_formatter(|v, _| format_time(v)),
            )
            .changed();
        if start_changed || end_changed {
            app.set_trim(TimeRange::new(start, end));
        }

        ui.label(format!("({})", format_time(range.span())));

        let is_full = range.start <= 0.0 && range.end >= duration;
        if ui
            .add_enabled(!is_full, egui::Button::new("Reset trim"))
            .clicked()
        {
            app.reset_trim();
        }
    });
}

fn render_export_bar(app: &mut TrimmerApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt("trim_mode")
            .selected_text(app.trim_mode.name())
            .show_ui(ui, |ui| {
                for mode in TrimMode::all() {
                    ui.selectable_value(&mut app.trim_mode, *mode, mode.name());
                }
            })
            .response
            .on_hover_text("Lossless cuts land on keyframes; the others re-encode");

        let output = app.output_path();
        let output_name = output
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut output_button = ui.add_enabled(output.is_some(), egui::Button::new(output_name));
        if let Some(path) = &output {
            output_button = output_button.on_hover_text(format!("{} (click to change)", path.display()));
        }
        if output_button.clicked() {
            app.choose_output();
        }

        let can_export = app.session.media().is_some() && app.session.trim_range().is_some();
        if ui
            .add_enabled(can_export, egui::Button::new("EXPORT"))
            .clicked()
        {
            app.start_export();
        }

        let queue = app.export_queue.lock();
        let (finished, total) = queue.total_progress();
        let is_processing = queue.is_processing;
        let running = queue.jobs.iter().find(|j| j.status == JobStatus::Running);
        let fraction = running.map(|j| j.fraction());
        drop(queue);

        if total > 0 {
            ui.separator();
            if let Some(fraction) = fraction {
                ui.spinner();
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .show_percentage()
                        .desired_width(150.0),
                );
            }
            ui.label(format!("{}/{}", finished, total));

            if finished < total && ui.button("Stop All").on_hover_text("Cancel pending exports").clicked() {
                app.cancel_exports();
            }
            if finished == total && !is_processing && ui.button("Clear").clicked() {
                app.clear_finished_jobs();
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(app.last_export.is_some(), egui::Button::new("Reveal"))
                .on_hover_text("Show the last export in the file manager")
                .clicked()
            {
                app.reveal_last_export();
            }
        });
    });
}

fn render_analysis_panel(app: &mut TrimmerApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.heading("Analysis");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(app.can_analyze(), egui::Button::new("Analyze"))
                .on_hover_text("Send a few sampled frames for a summary")
                .clicked()
            {
                app.start_analysis();
            }
        });
    });
    ui.separator();

    match &app.analysis {
        AnalysisState::Idle => {
            if app.session.thumbnails().is_empty() {
                ui.label("Open a video to analyze its frames.");
            } else {
                ui.label("Press Analyze to summarize this video.");
            }
        }
        AnalysisState::Running => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for the analysis service...");
            });
        }
        AnalysisState::Failed(e) => {
            ui.colored_label(ui.visuals().error_fg_color, e);
        }
        AnalysisState::Done(result) => {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .id_salt("analysis_scroll")
                .show(ui, |ui| {
                    ui.label(&result.summary);
                    if !result.highlights.is_empty() {
                        ui.add_space(8.0);
                        ui.strong("Highlights");
                        for highlight in &result.highlights {
                            ui.label(format!("- {}", highlight));
                        }
                    }
                });
        }
    }
}
