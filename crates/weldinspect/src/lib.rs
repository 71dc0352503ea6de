//! weldinspect — visual inspection of welded metal parts.
//!
//! Each frame goes through these stages:
//!
//! 1. **Presence** – mean-intensity test for a part in the fixture.
//! 2. **Holes** – Hough-gradient circle transform for the four mounting holes.
//! 3. **Spatter** – inverted threshold, morphological opening and contour
//!    area filtering for weld-spatter droplets.
//! 4. **Seams** – weld-seam lengths as edge-to-edge gaps between adjacent
//!    holes.
//! 5. **Classification** – additive defect checks producing an OK/NOK
//!    verdict.
//! 6. **Persistence** – annotated image with a non-overwriting name plus one
//!    appended row in the order's measurement record.
//!
//! # Public API
//! - [`inspect_frame`] runs stages 1–5 on a greyscale frame, without I/O.
//! - [`InspectionSession`] adds per-order counters, annotation and
//!   persistence.
//! - [`InspectionConfig`] holds every tunable, loadable from JSON.

mod annotate;
mod calibration;
mod classify;
mod config;
mod error;
pub mod features;
mod inspect;
mod measurement;
pub mod persist;
mod seams;
mod session;
mod source;
#[cfg(test)]
pub(crate) mod test_utils;

pub use annotate::{AnnotateError, AnnotationStyle, Annotator};
pub use calibration::MeasurementScale;
pub use classify::{
    classify, Band, Defect, SeamSide, Status, Thresholds, ToleranceConfig, Verdict,
};
pub use config::{InspectionConfig, ENV_MAX_SPATTER, ENV_OUTPUT_DIR, ENV_PART_THRESHOLD};
pub use error::{AcquisitionError, ConfigError, InspectError};
pub use features::{
    detect_holes, detect_part_presence, detect_spatter, extract_features, mean_intensity,
    Features, Hole, HoleDetectConfig, SpatterConfig,
};
pub use inspect::{inspect_frame, Inspection};
pub use measurement::{slot_holes, Measurements, SlotAssignment, SLOT_COUNT};
pub use persist::{next_free_path, CsvRecord, ImageName, RecordRow, RecordSink};
pub use seams::{derive_seams, seam_between, HoleGrid, SeamError, SeamSet};
pub use session::{InspectionResult, InspectionSession, SessionStats};
pub use source::{FrameSource, ImageFileSource};
