/// Upper bound on thumbnails sampled per media
pub const MAX_THUMBNAILS: usize = 30;

/// One filmstrip thumbnail. `image` is whatever handle the owner renders with.
#[derive(Debug, Clone)]
pub struct FrameThumbnail<I> {
    pub timestamp: f64,
    pub image: I,
}

impl<I> FrameThumbnail<I> {
    pub fn new(timestamp: f64, image: I) -> Self {
        Self { timestamp, image }
    }
}

/// Index of the thumbnail closest to `time`.
///
/// Linear scan; on equal distance the earlier thumbnail wins.
pub fn nearest_frame<I>(frames: &[FrameThumbnail<I>], time: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, frame) in frames.iter().enumerate() {
        let distance = (frame.timestamp - time).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}
