//! Shared synthetic fixtures for image-based unit tests.
//!
//! `render_part` draws the canonical inspected part: a grey plate on a white
//! background with four dark mounting holes, optional weld seams joining the
//! hole edges, and optional dark spatter dots.

use std::path::PathBuf;

use image::{Rgb, RgbImage};

use crate::Hole;

/// Scene description for [`render_part`].
#[derive(Debug, Clone)]
pub(crate) struct PartScene {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub part_value: u8,
    pub hole_radius: u32,
    /// Hole centers in image pixels.
    pub holes: Vec<(i32, i32)>,
    pub welds: bool,
    pub weld_thickness: i32,
    /// Spatter dots as `(x, y, radius)`.
    pub spatter: Vec<(i32, i32, i32)>,
    pub part_missing: bool,
}

impl Default for PartScene {
    fn default() -> Self {
        let (width, height, margin) = (600u32, 400u32, 40u32);
        let pw = (width - 2 * margin) as f32;
        let ph = (height - 2 * margin) as f32;
        let m = margin as i32;
        let holes = [(0.25, 0.3), (0.75, 0.3), (0.25, 0.7), (0.75, 0.7)]
            .iter()
            .map(|&(fx, fy)| (m + (fx * pw) as i32, m + (fy * ph) as i32))
            .collect();
        Self {
            width,
            height,
            margin,
            part_value: 200,
            hole_radius: 20,
            holes,
            welds: true,
            weld_thickness: 5,
            spatter: Vec::new(),
            part_missing: false,
        }
    }
}

impl PartScene {
    /// Holes the scene was drawn with, as ground truth.
    pub fn truth_holes(&self) -> Vec<Hole> {
        let d = 2.0 * self.hole_radius as f64;
        self.holes
            .iter()
            .map(|&(x, y)| Hole::circular((x, y), d))
            .collect()
    }
}

fn fill_disc(img: &mut RgbImage, cx: i32, cy: i32, r: i32, value: u8) {
    let (w, h) = img.dimensions();
    for y in (cy - r).max(0)..=(cy + r).min(h as i32 - 1) {
        for x in (cx - r).max(0)..=(cx + r).min(w as i32 - 1) {
            let dx = x - cx;
            let dy = y - cy;
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x as u32, y as u32, Rgb([value; 3]));
            }
        }
    }
}

fn fill_rect(img: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, value: u8) {
    let (w, h) = img.dimensions();
    for y in y0.max(0)..=y1.min(h as i32 - 1) {
        for x in x0.max(0)..=x1.min(w as i32 - 1) {
            img.put_pixel(x as u32, y as u32, Rgb([value; 3]));
        }
    }
}

/// Render a synthetic part frame.
pub(crate) fn render_part(scene: &PartScene) -> RgbImage {
    let mut img = RgbImage::from_pixel(scene.width, scene.height, Rgb([255; 3]));
    if scene.part_missing {
        return img;
    }
    let m = scene.margin as i32;
    fill_rect(
        &mut img,
        m,
        m,
        scene.width as i32 - m,
        scene.height as i32 - m,
        scene.part_value,
    );

    let r = scene.hole_radius as i32;
    for &(cx, cy) in &scene.holes {
        fill_disc(&mut img, cx, cy, r, 0);
    }

    if scene.welds && scene.holes.len() == 4 {
        let half = scene.weld_thickness / 2;
        let [tl, tr, bl, br] = [scene.holes[0], scene.holes[1], scene.holes[2], scene.holes[3]];
        // horizontal seams
        fill_rect(&mut img, tl.0 + r, tl.1 - half, tr.0 - r, tr.1 + half, 0);
        fill_rect(&mut img, bl.0 + r, bl.1 - half, br.0 - r, br.1 + half, 0);
        // vertical seams
        fill_rect(&mut img, tl.0 - half, tl.1 + r, bl.0 + half, bl.1 - r, 0);
        fill_rect(&mut img, tr.0 - half, tr.1 + r, br.0 + half, br.1 - r, 0);
    }

    for &(x, y, sr) in &scene.spatter {
        fill_disc(&mut img, x, y, sr, 0);
    }
    img
}

/// Fresh, empty scratch directory under the system temp dir.
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!(
        "weldinspect-{}-{}-{}",
        tag,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
