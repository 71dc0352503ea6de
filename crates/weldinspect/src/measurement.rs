//! Fixed 12-slot measurement record.
//!
//! Slot layout (1-based, as written to the record file):
//!
//! | slot  | value                  |
//! |-------|------------------------|
//! | 1, 2  | hole 1 width, height   |
//! | 3, 4  | hole 2 width, height   |
//! | 5     | top seam               |
//! | 6     | bottom seam            |
//! | 7, 8  | hole 3 width, height   |
//! | 9, 10 | hole 4 width, height   |
//! | 11    | left seam              |
//! | 12    | right seam             |

use crate::calibration::MeasurementScale;
use crate::features::Hole;
use crate::seams::{HoleGrid, SeamSet};

pub const SLOT_COUNT: usize = 12;

const HOLE_SLOTS: [(usize, usize); 4] = [(0, 1), (2, 3), (6, 7), (8, 9)];
const TOP: usize = 4;
const BOTTOM: usize = 5;
const LEFT: usize = 10;
const RIGHT: usize = 11;

/// Which hole goes into which hole slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAssignment {
    /// Holes sorted by `x` (then `y`); the historical record layout.
    #[default]
    AscendingX,
    /// Holes in grid order: top-left, top-right, bottom-left, bottom-right.
    Grid,
}

/// Up to four holes, in slot order.
pub fn slot_holes(holes: &[Hole], assignment: SlotAssignment) -> Vec<Hole> {
    if assignment == SlotAssignment::Grid {
        if let Some(grid) = HoleGrid::from_holes(holes) {
            return grid.as_array().to_vec();
        }
    }
    let mut sorted = holes.to_vec();
    sorted.sort_by_key(|h| (h.center.0, h.center.1));
    sorted.truncate(4);
    sorted
}

/// The twelve recorded values of one part.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Measurements {
    values: [f64; SLOT_COUNT],
}

impl Measurements {
    /// Fill the slots from holes and seams.
    ///
    /// Missing holes leave their slots at 0.0; without seams the seam slots
    /// stay 0.0. A scale, if given, converts every value to millimetres.
    pub fn assemble(
        holes: &[Hole],
        seams: Option<&SeamSet>,
        assignment: SlotAssignment,
        scale: Option<&MeasurementScale>,
    ) -> Self {
        let mut values = [0.0; SLOT_COUNT];
        for (hole, &(wi, hi)) in slot_holes(holes, assignment).iter().zip(HOLE_SLOTS.iter()) {
            values[wi] = hole.width;
            values[hi] = hole.height;
        }
        if let Some(s) = seams {
            values[TOP] = s.top;
            values[BOTTOM] = s.bottom;
            values[LEFT] = s.left;
            values[RIGHT] = s.right;
        }
        if let Some(scale) = scale {
            for v in values.iter_mut() {
                *v = scale.apply(*v);
            }
        }
        Self { values }
    }

    pub fn values(&self) -> &[f64; SLOT_COUNT] {
        &self.values
    }

    /// Values as written to the record: two decimals, non-finite as 0.0.
    pub fn record_values(&self) -> [f64; SLOT_COUNT] {
        self.values.map(|v| {
            if v.is_finite() {
                (v * 100.0).round() / 100.0
            } else {
                0.0
            }
        })
    }

    /// Width and height of hole slot `index` (0..4).
    pub fn hole(&self, index: usize) -> Option<(f64, f64)> {
        HOLE_SLOTS
            .get(index)
            .map(|&(wi, hi)| (self.values[wi], self.values[hi]))
    }

    pub fn seams(&self) -> SeamSet {
        SeamSet {
            top: self.values[TOP],
            bottom: self.values[BOTTOM],
            left: self.values[LEFT],
            right: self.values[RIGHT],
        }
    }
}
