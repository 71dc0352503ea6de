//! Weld-seam lengths derived from mounting-hole geometry.
//!
//! The four holes sit at the corners of a rectangle and each weld seam runs
//! between the edges of two adjacent holes, so a seam length is the center
//! distance minus both radii.

use nalgebra::Point2;

use crate::features::Hole;

/// Lengths of the four seams (pixels, or millimetres once scaled).
///
/// Overlapping holes give negative values; they are reported as-is.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SeamSet {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeamError {
    #[error("insufficient holes for weld measurement: need 4, found {found}")]
    InsufficientHoles { found: usize },
}

/// The four holes arranged as a 2x2 grid.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HoleGrid {
    pub top_left: Hole,
    pub top_right: Hole,
    pub bottom_left: Hole,
    pub bottom_right: Hole,
}

impl HoleGrid {
    /// Arrange the first four holes (by `y`, then `x`) into rows.
    ///
    /// The two smallest-`y` holes form the top row; within a row holes are
    /// ordered by `x`, then `y`. Holes beyond the fourth are ignored.
    /// Returns `None` for fewer than four holes.
    pub fn from_holes(holes: &[Hole]) -> Option<Self> {
        if holes.len() < 4 {
            return None;
        }
        let mut by_y: Vec<Hole> = holes.to_vec();
        by_y.sort_by_key(|h| (h.center.1, h.center.0));

        let mut top = [by_y[0], by_y[1]];
        let mut bottom = [by_y[2], by_y[3]];
        top.sort_by_key(|h| (h.center.0, h.center.1));
        bottom.sort_by_key(|h| (h.center.0, h.center.1));

        Some(Self {
            top_left: top[0],
            top_right: top[1],
            bottom_left: bottom[0],
            bottom_right: bottom[1],
        })
    }

    /// Holes in grid order: TL, TR, BL, BR.
    pub fn as_array(&self) -> [Hole; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn seams(&self) -> SeamSet {
        SeamSet {
            top: seam_between(&self.top_left, &self.top_right),
            bottom: seam_between(&self.bottom_left, &self.bottom_right),
            left: seam_between(&self.top_left, &self.bottom_left),
            right: seam_between(&self.top_right, &self.bottom_right),
        }
    }
}

fn center_point(h: &Hole) -> Point2<f64> {
    let [x, y] = h.center_xy();
    Point2::new(x, y)
}

/// Edge-to-edge gap between two holes.
pub fn seam_between(a: &Hole, b: &Hole) -> f64 {
    nalgebra::distance(&center_point(a), &center_point(b)) - a.radius() - b.radius()
}

/// Derive the four seam lengths from detected holes.
pub fn derive_seams(holes: &[Hole]) -> Result<SeamSet, SeamError> {
    HoleGrid::from_holes(holes)
        .map(|g| g.seams())
        .ok_or(SeamError::InsufficientHoles { found: holes.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect_holes(x0: i32, y0: i32, w: i32, h: i32, d: f64) -> Vec<Hole> {
        vec![
            Hole::circular((x0, y0), d),
            Hole::circular((x0 + w, y0), d),
            Hole::circular((x0, y0 + h), d),
            Hole::circular((x0 + w, y0 + h), d),
        ]
    }

    #[test]
    fn gap_between_two_holes() {
        let a = Hole::circular((0, 0), 30.0);
        let b = Hole::circular((100, 0), 40.0);
        assert_relative_eq!(seam_between(&a, &b), 65.0);
    }

    #[test]
    fn rectangle_seams() {
        let seams = derive_seams(&rect_holes(100, 100, 200, 150, 40.0)).expect("4 holes");
        assert_relative_eq!(seams.top, 160.0);
        assert_relative_eq!(seams.bottom, 160.0);
        assert_relative_eq!(seams.left, 110.0);
        assert_relative_eq!(seams.right, 110.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut holes = rect_holes(50, 60, 200, 100, 40.0);
        let expected = derive_seams(&holes).expect("4 holes");
        holes.reverse();
        holes.swap(0, 2);
        assert_eq!(derive_seams(&holes).expect("4 holes"), expected);
    }

    #[test]
    fn translation_invariant() {
        let a = derive_seams(&rect_holes(10, 20, 300, 180, 38.0)).expect("4 holes");
        let b = derive_seams(&rect_holes(410, 220, 300, 180, 38.0)).expect("4 holes");
        assert_relative_eq!(a.top, b.top, epsilon = 1e-9);
        assert_relative_eq!(a.bottom, b.bottom, epsilon = 1e-9);
        assert_relative_eq!(a.left, b.left, epsilon = 1e-9);
        assert_relative_eq!(a.right, b.right, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_holes_give_negative_seam() {
        let holes = rect_holes(0, 0, 30, 200, 40.0);
        let seams = derive_seams(&holes).expect("4 holes");
        assert_relative_eq!(seams.top, -10.0);
    }

    #[test]
    fn fewer_than_four_holes_is_an_error() {
        let holes = &rect_holes(0, 0, 100, 100, 40.0)[..3];
        assert_eq!(
            derive_seams(holes),
            Err(SeamError::InsufficientHoles { found: 3 })
        );
        assert!(HoleGrid::from_holes(holes).is_none());
    }

    #[test]
    fn equal_y_ties_break_on_x() {
        let holes = vec![
            Hole::circular((300, 100), 40.0),
            Hole::circular((100, 100), 40.0),
            Hole::circular((300, 300), 40.0),
            Hole::circular((100, 300), 40.0),
        ];
        let g = HoleGrid::from_holes(&holes).expect("grid");
        assert_eq!(g.top_left.center, (100, 100));
        assert_eq!(g.top_right.center, (300, 100));
        assert_eq!(g.bottom_left.center, (100, 300));
        assert_eq!(g.bottom_right.center, (300, 300));
    }

    #[test]
    fn extra_holes_are_ignored() {
        let mut holes = rect_holes(0, 0, 200, 100, 40.0);
        holes.push(Hole::circular((100, 500), 40.0));
        let g = HoleGrid::from_holes(&holes).expect("grid");
        assert_eq!(g.bottom_right.center, (200, 100));
    }
}
