//! Error types shared across the inspection pipeline.
//!
//! Detection outcomes (missing part, missing holes, spatter) are never errors;
//! they are recorded as [`crate::Defect`]s. The types here cover operational
//! failures only: configuration, acquisition and persistence.

use std::path::PathBuf;

/// Failure of an inspection call that is not a classification outcome.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// No frame could be obtained from the frame source.
    #[error("frame acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// The per-order output directory could not be created.
    #[error("failed to prepare order directory {}: {source}", path.display())]
    OrderDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The annotated image could not be written.
    #[error("failed to write annotated image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The measurement row could not be appended.
    #[error("failed to append measurement record {}: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The annotator could not be built from the configured style.
    #[error(transparent)]
    Annotate(#[from] crate::annotate::AnnotateError),
}

/// Failure to obtain a frame from a [`crate::FrameSource`].
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// The source has no more frames.
    #[error("frame source exhausted")]
    Exhausted,

    /// A frame file exists in the queue but could not be decoded.
    #[error("failed to read frame {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Device-level failure reported by an external camera integration.
    #[error("camera error: {0}")]
    Device(String),
}

/// Failure to load or validate an [`crate::InspectionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
