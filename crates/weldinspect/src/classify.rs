//! OK/NOK classification of extracted features.
//!
//! Every check runs independently and appends its own defect, so a single
//! verdict lists every reason a part failed.

use std::fmt;

use crate::features::Features;
use crate::measurement::{slot_holes, SlotAssignment};
use crate::seams::SeamSet;

/// Pass/fail outcome of one inspected part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Nok => "NOK",
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeamSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl fmt::Display for SeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeamSide::Top => "Top",
            SeamSide::Bottom => "Bottom",
            SeamSide::Left => "Left",
            SeamSide::Right => "Right",
        })
    }
}

/// A single reason for a NOK verdict. `Display` gives the operator message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    PartMissing,
    MissingHoles { expected: usize, found: usize },
    ExtraHoles { expected: usize, found: usize },
    InsufficientHolesForSeams { found: usize },
    ExcessiveSpatter { count: usize },
    /// `index` is the 1-based measurement slot of the hole.
    HoleDiameterOutOfTolerance { index: usize, diameter: f64 },
    SeamLengthOutOfTolerance { side: SeamSide, length: f64 },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::PartMissing => write!(f, "Part Missing"),
            Defect::MissingHoles { expected, found } => {
                write!(f, "Missing holes: expected {expected}, found {found}")
            }
            Defect::ExtraHoles { expected, found } => {
                write!(f, "Extra holes: expected {expected}, found {found}")
            }
            Defect::InsufficientHolesForSeams { .. } => {
                write!(f, "Insufficient holes for weld measurement")
            }
            Defect::ExcessiveSpatter { count } => {
                write!(f, "Excessive spatter: {count} detected")
            }
            Defect::HoleDiameterOutOfTolerance { index, diameter } => {
                write!(f, "Hole {index} diameter out of tolerance: {diameter:.2}")
            }
            Defect::SeamLengthOutOfTolerance { side, length } => {
                write!(f, "{side} seam out of tolerance: {length:.2}")
            }
        }
    }
}

/// Closed acceptance band `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Dimensional tolerances, in pixels.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    pub hole_diameter: Band,
    pub seam_length: Band,
    /// When false the bands are carried but never produce defects.
    pub enforce: bool,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            hole_diameter: Band::new(35.0, 45.0),
            seam_length: Band::new(80.0, 120.0),
            enforce: false,
        }
    }
}

/// Decision thresholds for [`classify`].
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub expected_hole_count: usize,
    pub max_spatter_count: usize,
    pub tolerances: ToleranceConfig,
    /// Slot order used to number holes in tolerance defects.
    pub slot_assignment: SlotAssignment,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            expected_hole_count: 4,
            max_spatter_count: 5,
            tolerances: ToleranceConfig::default(),
            slot_assignment: SlotAssignment::default(),
        }
    }
}

/// Classification result. `status` is NOK iff `defects` is non-empty.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub defects: Vec<Defect>,
}

impl Verdict {
    fn from_defects(defects: Vec<Defect>) -> Self {
        let status = if defects.is_empty() {
            Status::Ok
        } else {
            Status::Nok
        };
        Self { status, defects }
    }

    /// Operator-facing defect messages.
    pub fn messages(&self) -> Vec<String> {
        self.defects.iter().map(ToString::to_string).collect()
    }
}

/// Classify a part from its features and (if derivable) seam lengths.
pub fn classify(features: &Features, seams: Option<&SeamSet>, thresholds: &Thresholds) -> Verdict {
    if !features.part_present {
        return Verdict::from_defects(vec![Defect::PartMissing]);
    }

    let mut defects = Vec::new();
    let found = features.holes.len();
    let expected = thresholds.expected_hole_count;
    if found < expected {
        defects.push(Defect::MissingHoles { expected, found });
    } else if found > expected {
        defects.push(Defect::ExtraHoles { expected, found });
    }

    if found < 4 {
        defects.push(Defect::InsufficientHolesForSeams { found });
    }

    if features.spatter_count > thresholds.max_spatter_count {
        defects.push(Defect::ExcessiveSpatter {
            count: features.spatter_count,
        });
    }

    let tol = &thresholds.tolerances;
    if tol.enforce {
        for (i, hole) in slot_holes(&features.holes, thresholds.slot_assignment)
            .iter()
            .enumerate()
        {
            if !tol.hole_diameter.contains(hole.diameter()) {
                defects.push(Defect::HoleDiameterOutOfTolerance {
                    index: i + 1,
                    diameter: hole.diameter(),
                });
            }
        }
        if let Some(s) = seams {
            for (side, length) in [
                (SeamSide::Top, s.top),
                (SeamSide::Bottom, s.bottom),
                (SeamSide::Left, s.left),
                (SeamSide::Right, s.right),
            ] {
                if !tol.seam_length.contains(length) {
                    defects.push(Defect::SeamLengthOutOfTolerance { side, length });
                }
            }
        }
    }

    for d in &defects {
        tracing::warn!("defect: {}", d);
    }
    Verdict::from_defects(defects)
}
