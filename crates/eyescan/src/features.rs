//! Pupil measurement from a normalized eye photograph.
//!
//! The pupil is taken to be the largest dark blob in the frame:
//!
//! 1. Convert to single-channel intensity with BT.601 weights.
//! 2. Inverted binary threshold, so pixels at or below `dark_threshold`
//!    become foreground.
//! 3. Trace outer borders of the foreground regions.
//! 4. Keep the border enclosing the largest area and fit its minimum
//!    enclosing circle.
//!
//! The reported diameter is in image pixels. No pixel-to-millimeter
//! calibration exists, so the value is labelled millimeters at a 1:1 scale.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::geometry::contour_area;
use imageproc::map::map_colors;

use crate::circle::{min_enclosing_circle, Circle};

/// Placeholder iris pattern tag; no iris texture analysis is performed.
pub const IRIS_PATTERN_PLACEHOLDER: &str = "uniform";

/// Configuration for pupil extraction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Intensity (0-255) at or below which a pixel counts as pupil.
    pub dark_threshold: u8,
    /// Shuffle seed for the enclosing-circle solver.
    pub seed: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            dark_threshold: 50,
            seed: 42,
        }
    }
}

/// Features derived from one image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtractedFeatures {
    /// Pupil diameter in pixels, reported as millimeters (1:1 scale).
    /// `None` when no dark region was found.
    pub pupil_size_mm: Option<f64>,
    /// Iris pattern tag. Always [`IRIS_PATTERN_PLACEHOLDER`] from the extractor.
    pub iris_pattern: Option<String>,
    /// Enclosing circle of the selected pupil contour, in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil_circle: Option<Circle>,
}

impl ExtractedFeatures {
    /// Features with an explicit pupil measurement and the placeholder iris tag.
    pub fn with_pupil_size(pupil_size_mm: Option<f64>) -> Self {
        Self {
            pupil_size_mm,
            iris_pattern: Some(IRIS_PATTERN_PLACEHOLDER.to_string()),
            pupil_circle: None,
        }
    }
}

/// Extract pupil diameter and iris tag from a normalized RGB image.
pub fn extract_features(image: &RgbImage, config: &ExtractConfig) -> ExtractedFeatures {
    extract_features_gray(&to_intensity(image), config)
}

/// BT.601 luma (0.299 R + 0.587 G + 0.114 B) in 14-bit fixed point,
/// rounded to nearest.
fn bt601_luma(p: Rgb<u8>) -> u8 {
    let [r, g, b] = p.0;
    let y = (4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32 + (1 << 13)) >> 14;
    y.min(255) as u8
}

/// Single-channel intensity image using [`bt601_luma`].
fn to_intensity(image: &RgbImage) -> GrayImage {
    map_colors(image, |p| Luma([bt601_luma(p)]))
}

/// Same as [`extract_features`] for an image already reduced to intensity.
pub fn extract_features_gray(gray: &GrayImage, config: &ExtractConfig) -> ExtractedFeatures {
    let circle = find_pupil_circle(gray, config);
    ExtractedFeatures {
        pupil_size_mm: circle.map(|c| c.diameter()),
        iris_pattern: Some(IRIS_PATTERN_PLACEHOLDER.to_string()),
        pupil_circle: circle,
    }
}

fn find_pupil_circle(gray: &GrayImage, config: &ExtractConfig) -> Option<Circle> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }

    let mask = threshold(gray, config.dark_threshold, ThresholdType::BinaryInverted);
    let contours = find_contours::<i32>(&mask);

    // Outermost borders only; holes and nested regions are ignored.
    let outer: Vec<Contour<i32>> = contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .collect();

    tracing::debug!("{} dark contours found", outer.len());

    // First contour wins ties.
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for c in &outer {
        let area = contour_area(&c.points).abs();
        if best.map_or(true, |(_, a)| area > a) {
            best = Some((c, area));
        }
    }
    let (contour, area) = best?;
    let pts: Vec<[f64; 2]> = contour
        .points
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();

    let circle = min_enclosing_circle(&pts, config.seed)?;
    tracing::debug!(
        "pupil contour: {} points, area={:.1}px², center=({:.1}, {:.1}), r={:.2}px",
        pts.len(),
        area,
        circle.cx,
        circle.cy,
        circle.radius
    );
    Some(circle)
}
