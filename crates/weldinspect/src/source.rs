//! Frame acquisition boundary.
//!
//! Camera drivers live outside this crate and plug in through
//! [`FrameSource`]. [`ImageFileSource`] replays frames from disk.

use std::collections::VecDeque;
use std::path::PathBuf;

use image::RgbImage;

use crate::error::AcquisitionError;

/// Anything that can deliver one colour frame per call.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbImage, AcquisitionError>;
}

/// Frames read from a queue of image files, in order.
#[derive(Debug, Clone, Default)]
pub struct ImageFileSource {
    queue: VecDeque<PathBuf>,
}

impl ImageFileSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.queue.push_back(path.into());
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> Result<RgbImage, AcquisitionError> {
        let path = self.queue.pop_front().ok_or(AcquisitionError::Exhausted)?;
        tracing::debug!("reading frame {}", path.display());
        let img = image::open(&path).map_err(|source| AcquisitionError::Read { path, source })?;
        Ok(img.to_rgb8())
    }
}
