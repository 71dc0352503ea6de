//! Inspection configuration.
//!
//! Loaded from JSON (every field optional, missing fields take defaults) and
//! optionally overridden from `INSPECTION_*` environment variables.

use std::path::{Path, PathBuf};

use crate::annotate::AnnotationStyle;
use crate::calibration::MeasurementScale;
use crate::classify::{Band, Thresholds, ToleranceConfig};
use crate::error::ConfigError;
use crate::features::{HoleDetectConfig, SpatterConfig, DEFAULT_PRESENCE_THRESHOLD};
use crate::measurement::SlotAssignment;

pub const ENV_PART_THRESHOLD: &str = "INSPECTION_PART_THRESHOLD";
pub const ENV_MAX_SPATTER: &str = "INSPECTION_MAX_SPATTER";
pub const ENV_OUTPUT_DIR: &str = "INSPECTION_OUTPUT_DIR";

/// Top-level inspection configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Mean intensity below which a part is considered present.
    pub part_presence_threshold: f64,
    pub expected_hole_count: usize,
    /// Spatter counts above this value fail the part.
    pub max_spatter_count: usize,
    pub holes: HoleDetectConfig,
    pub spatter: SpatterConfig,
    pub tolerances: ToleranceConfig,
    pub slot_assignment: SlotAssignment,
    /// Optional px -> mm conversion for recorded values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<MeasurementScale>,
    /// Root of the per-order output directories.
    pub output_dir: PathBuf,
    pub annotation: AnnotationStyle,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            part_presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
            expected_hole_count: 4,
            max_spatter_count: 5,
            holes: HoleDetectConfig::default(),
            spatter: SpatterConfig::default(),
            tolerances: ToleranceConfig::default(),
            slot_assignment: SlotAssignment::default(),
            scale: None,
            output_dir: PathBuf::from("output"),
            annotation: AnnotationStyle::default(),
        }
    }
}

fn validate_band(name: &str, band: &Band) -> Result<(), String> {
    if !band.min.is_finite() || !band.max.is_finite() || band.min >= band.max {
        return Err(format!(
            "{name} band must be finite with min < max (got [{}, {}])",
            band.min, band.max
        ));
    }
    Ok(())
}

impl InspectionConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Apply `INSPECTION_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Values that fail to
    /// parse are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PART_THRESHOLD) {
            match raw.trim().parse::<f64>() {
                Ok(v) => self.part_presence_threshold = v,
                Err(e) => tracing::warn!("ignoring {}={:?}: {}", ENV_PART_THRESHOLD, raw, e),
            }
        }
        if let Some(raw) = lookup(ENV_MAX_SPATTER) {
            match raw.trim().parse::<usize>() {
                Ok(v) => self.max_spatter_count = v,
                Err(e) => tracing::warn!("ignoring {}={:?}: {}", ENV_MAX_SPATTER, raw, e),
            }
        }
        if let Some(raw) = lookup(ENV_OUTPUT_DIR) {
            if raw.trim().is_empty() {
                tracing::warn!("ignoring empty {}", ENV_OUTPUT_DIR);
            } else {
                self.output_dir = PathBuf::from(raw);
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let t = self.part_presence_threshold;
        if !t.is_finite() || t <= 0.0 || t > 255.0 {
            return Err(format!("part_presence_threshold must be in (0, 255] (got {t})"));
        }
        if self.expected_hole_count == 0 {
            return Err("expected_hole_count must be >= 1".to_string());
        }

        let h = &self.holes;
        if h.min_radius_px >= h.max_radius_px {
            return Err(format!(
                "holes.min_radius_px must be < holes.max_radius_px (got {} >= {})",
                h.min_radius_px, h.max_radius_px
            ));
        }
        if !h.accumulator_resolution.is_finite() || h.accumulator_resolution <= 0.0 {
            return Err("holes.accumulator_resolution must be finite and > 0".to_string());
        }
        if !h.blur_sigma.is_finite() || h.blur_sigma < 0.0 {
            return Err("holes.blur_sigma must be finite and >= 0".to_string());
        }

        let s = &self.spatter;
        if !s.min_area.is_finite() || !s.max_area.is_finite() || s.min_area >= s.max_area {
            return Err(format!(
                "spatter area band must satisfy min_area < max_area (got [{}, {}])",
                s.min_area, s.max_area
            ));
        }

        validate_band("tolerances.hole_diameter", &self.tolerances.hole_diameter)?;
        validate_band("tolerances.seam_length", &self.tolerances.seam_length)?;

        if let Some(scale) = &self.scale {
            if !scale.is_valid() {
                return Err(format!(
                    "scale.mm_per_px must be finite and > 0 (got {})",
                    scale.mm_per_px
                ));
            }
        }
        Ok(())
    }

    /// Classification thresholds carried by this configuration.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            expected_hole_count: self.expected_hole_count,
            max_spatter_count: self.max_spatter_count,
            tolerances: self.tolerances.clone(),
            slot_assignment: self.slot_assignment,
        }
    }
}
