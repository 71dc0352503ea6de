//! Linear pixel-to-millimetre scale for recorded measurements.
//!
//! Derived from one reference feature of known physical size. Detection and
//! classification always stay in pixels; only the measurement record is
//! rescaled.

/// Millimetres per pixel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasurementScale {
    pub mm_per_px: f64,
}

impl MeasurementScale {
    /// Scale from a reference object `reference_mm` long that measures
    /// `reference_px` in the image. Returns `None` unless both are finite and
    /// positive.
    pub fn from_reference(reference_mm: f64, reference_px: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(reference_mm) || !valid(reference_px) {
            return None;
        }
        Some(Self {
            mm_per_px: reference_mm / reference_px,
        })
    }

    pub fn apply(&self, px: f64) -> f64 {
        px * self.mm_per_px
    }

    pub fn is_valid(&self) -> bool {
        self.mm_per_px.is_finite() && self.mm_per_px > 0.0
    }
}
