//! Shared test utilities for image-based unit tests.

use image::{Rgb, RgbImage};

/// Render a synthetic eye photo: a filled disk on a flat background.
///
/// Pixels at distance `d <= radius` from `center` get `disk_rgb`,
/// all others `bg_rgb`.
pub(crate) fn draw_disk_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    disk_rgb: [u8; 3],
    bg_rgb: [u8; 3],
) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            let d = (dx * dx + dy * dy).sqrt();
            let pix = if d <= radius { disk_rgb } else { bg_rgb };
            img.put_pixel(x, y, Rgb(pix));
        }
    }
    img
}
