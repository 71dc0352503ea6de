//! Per-frame feature extraction: part presence, mounting holes, spatter.

pub mod holes;
pub mod presence;
pub mod spatter;

use image::GrayImage;

use crate::config::InspectionConfig;
pub use holes::{detect_holes, Hole, HoleDetectConfig};
pub use presence::{detect_part_presence, mean_intensity, DEFAULT_PRESENCE_THRESHOLD};
pub use spatter::{detect_spatter, SpatterConfig};

/// Raw features of one frame, before classification.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Features {
    pub part_present: bool,
    /// Detected holes in detection order.
    pub holes: Vec<Hole>,
    pub spatter_count: usize,
}

/// Run all feature detectors on a greyscale frame.
///
/// When no part is present the hole and spatter detectors are skipped; an
/// empty fixture has nothing to measure.
pub fn extract_features(gray: &GrayImage, config: &InspectionConfig) -> Features {
    let part_present = detect_part_presence(gray, config.part_presence_threshold);
    if !part_present {
        tracing::debug!("no part present, skipping hole and spatter detection");
        return Features::default();
    }

    let holes = detect_holes(gray, &config.holes);
    let spatter_count = detect_spatter(gray, &config.spatter);
    tracing::debug!(
        "features: {} holes, {} spatter blobs",
        holes.len(),
        spatter_count
    );

    Features {
        part_present,
        holes,
        spatter_count,
    }
}
