//! Non-overwriting image file naming.

use std::path::{Path, PathBuf};

use crate::classify::Status;

pub const IMAGE_EXTENSION: &str = "jpg";

/// Identity of one saved inspection image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    pub status: Status,
    pub order_number: String,
    pub part_number: String,
    pub counter: u64,
    pub cam_id: String,
}

/// Path separators would escape the order directory.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

impl ImageName {
    /// `{status}_{order}_{part}Count{counter}_CAM{cam}`, without extension.
    pub fn stem(&self) -> String {
        format!(
            "{}_{}_{}Count{}_CAM{}",
            self.status,
            sanitize(&self.order_number),
            sanitize(&self.part_number),
            self.counter,
            sanitize(&self.cam_id)
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem(), IMAGE_EXTENSION)
    }
}

/// First path in `dir` for `name` that does not exist yet.
///
/// The plain name is tried first, then `_1`, `_2`, ... appended to the stem.
/// Repeated calls return the same path until something is written there.
pub fn next_free_path(dir: &Path, name: &ImageName) -> PathBuf {
    let base = dir.join(name.file_name());
    if !base.exists() {
        return base;
    }
    let stem = name.stem();
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{n}.{IMAGE_EXTENSION}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
