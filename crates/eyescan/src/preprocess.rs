//! Image loading and resolution normalization.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;

use crate::error::AnalysisError;

/// Open a raster image from disk and convert it to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage, AnalysisError> {
    let img = image::open(path).map_err(|e| AnalysisError::Image {
        path: Some(path.to_path_buf()),
        source: e,
    })?;
    Ok(img.to_rgb8())
}

/// Decode an in-memory encoded image (jpeg, png, ...) to 8-bit RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Resize to the fixed analysis resolution `[width, height]`.
///
/// Aspect ratio is not preserved. Images already at the target size are
/// returned unchanged. The triangle (bilinear) filter approximates area
/// averaging; results can differ slightly from a true area resampler.
pub fn normalize_image(image: &RgbImage, target_size: [u32; 2]) -> RgbImage {
    let [w, h] = target_size;
    if image.dimensions() == (w, h) {
        return image.clone();
    }
    image::imageops::resize(image, w, h, FilterType::Triangle)
}
