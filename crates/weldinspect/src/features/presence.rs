//! Part-presence check from global frame brightness.
//!
//! An empty fixture images as a bright, nearly uniform background. A part
//! covers it with darker material, pulling the mean intensity down.

use image::GrayImage;

/// Default mean-intensity threshold on the 8-bit scale.
pub const DEFAULT_PRESENCE_THRESHOLD: f64 = 240.0;

/// Arithmetic mean of all pixel intensities, or `None` for a zero-area frame.
pub fn mean_intensity(gray: &GrayImage) -> Option<f64> {
    let n = gray.as_raw().len();
    if n == 0 {
        return None;
    }
    let sum: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();
    Some(sum as f64 / n as f64)
}

/// Returns `true` when a part is present, i.e. the mean is strictly below
/// `threshold`. A zero-area frame reports no part.
pub fn detect_part_presence(gray: &GrayImage, threshold: f64) -> bool {
    match mean_intensity(gray) {
        Some(mean) => {
            tracing::debug!("frame mean intensity {:.2} (threshold {:.2})", mean, threshold);
            mean < threshold
        }
        None => false,
    }
}
