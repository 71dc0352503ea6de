//! Weld-spatter counting.
//!
//! Spatter shows up as small dark droplets on the bright part surface. The
//! frame is binarized (dark = foreground), opened to remove single-pixel
//! noise, and the outer contours whose enclosed area falls inside a size band
//! are counted.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::distance_transform::Norm;

/// Configuration for spatter counting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpatterConfig {
    /// Pixels with intensity `<= binary_threshold` are foreground.
    pub binary_threshold: u8,
    /// Opening radius in 3x3 steps (2 = erode twice, then dilate twice).
    pub open_iterations: u8,
    /// Exclusive lower bound on blob area (pixels^2).
    pub min_area: f64,
    /// Exclusive upper bound on blob area (pixels^2).
    pub max_area: f64,
}

impl Default for SpatterConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 220,
            open_iterations: 2,
            min_area: 3.0,
            max_area: 100.0,
        }
    }
}

/// Inverted binarization: dark pixels become 255, the rest 0.
fn binarize_dark(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = GrayImage::new(w, h);
    for (src, dst) in gray.pixels().zip(out.pixels_mut()) {
        if src.0[0] <= threshold {
            *dst = Luma([255]);
        }
    }
    out
}

/// Enclosed area of a closed contour polygon (shoelace formula).
pub(crate) fn contour_area(contour: &Contour<i32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in pts.iter().enumerate() {
        let q = &pts[(i + 1) % pts.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice as f64).abs() * 0.5
}

/// Count spatter blobs in a greyscale frame.
pub fn detect_spatter(gray: &GrayImage, config: &SpatterConfig) -> usize {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return 0;
    }

    let mask = binarize_dark(gray, config.binary_threshold);
    let opened = if config.open_iterations > 0 {
        imageproc::morphology::open(&mask, Norm::LInf, config.open_iterations)
    } else {
        mask
    };

    let contours = find_contours::<i32>(&opened);
    let areas: Vec<f64> = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .map(contour_area)
        .collect();
    let count = areas
        .iter()
        .filter(|&&a| a > config.min_area && a < config.max_area)
        .count();

    tracing::debug!(
        "spatter: {} outer contours, {} in area band",
        areas.len(),
        count
    );
    count
}
