//! Single-frame inspection without side effects.

use image::GrayImage;

use crate::classify::{classify, Verdict};
use crate::config::InspectionConfig;
use crate::features::{extract_features, Features};
use crate::measurement::Measurements;
use crate::seams::{HoleGrid, SeamSet};

/// Everything derived from one frame.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Inspection {
    pub features: Features,
    /// Grid arrangement of the first four holes, if there are four.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<HoleGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seams: Option<SeamSet>,
    pub verdict: Verdict,
    pub measurements: Measurements,
}

/// Extract features, derive seams, classify, and fill the measurement slots.
pub fn inspect_frame(gray: &GrayImage, config: &InspectionConfig) -> Inspection {
    let features = extract_features(gray, config);
    let grid = HoleGrid::from_holes(&features.holes);
    let seams = grid.as_ref().map(HoleGrid::seams);
    let verdict = classify(&features, seams.as_ref(), &config.thresholds());
    let measurements = Measurements::assemble(
        &features.holes,
        seams.as_ref(),
        config.slot_assignment,
        config.scale.as_ref(),
    );

    Inspection {
        features,
        grid,
        seams,
        verdict,
        measurements,
    }
}
