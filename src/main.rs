#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod analysis;
mod app;
mod config;
mod export;
mod ffmpeg;
mod player;
mod project;
mod session;
mod timeline;
mod ui;
mod utils;

use anyhow::{anyhow, Context, Result};
use app::TrimmerApp;
use config::AppConfig;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("video-trimmer-worker")
        .build()
        .context("failed to start the async runtime")?;

    // A file given on the command line is opened at startup
    let initial = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("Video Trimmer"),
        ..Default::default()
    };

    eframe::run_native(
        "Video Trimmer",
        options,
        Box::new(move |cc| {
            let mut app = TrimmerApp::new(cc, config, runtime);
            if let Some(path) = initial {
                app.open_file(path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("{}", e))
}
