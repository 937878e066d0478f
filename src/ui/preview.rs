use crate::player::VideoFrame;
use anyhow::{Context, Result};
use eframe::egui;
use std::sync::Arc;

/// Filmstrip image: the uploaded texture plus the encoded bytes, which are
/// reused for analysis requests
#[derive(Clone)]
pub struct Thumbnail {
    pub texture: egui::TextureHandle,
    pub jpeg: Arc<[u8]>,
}

impl Thumbnail {
    pub fn load(ctx: &egui::Context, name: &str, jpeg: Vec<u8>) -> Result<Self> {
        let image = decode_image(&jpeg)?;
        let texture = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
        Ok(Self {
            texture,
            jpeg: jpeg.into(),
        })
    }
}

/// Decode an encoded image (JPEG, PNG) into egui pixels
pub fn decode_image(bytes: &[u8]) -> Result<egui::ColorImage> {
    let image = image::load_from_memory(bytes).context("undecodable image")?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub fn frame_to_image(frame: &VideoFrame) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.data,
    )
}

/// Largest size with the aspect ratio of `content` that fits in `available`
pub fn fit_size(content: egui::Vec2, available: egui::Vec2) -> egui::Vec2 {
    if content.x <= 0.0 || content.y <= 0.0 || available.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let aspect_ratio = content.x / content.y;
    if available.x / available.y > aspect_ratio {
        egui::vec2(available.y * aspect_ratio, available.y)
    } else {
        egui::vec2(available.x, available.x / aspect_ratio)
    }
}
