//! Overlay rendering of inspection results onto the captured frame.
//!
//! Labels use the bundled DejaVu Sans unless a font file is configured.

use std::path::PathBuf;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::classify::Status;
use crate::features::Hole;
use crate::inspect::Inspection;
use crate::seams::HoleGrid;

const DEFECT_TEXT_ORIGIN: (i32, i32) = (20, 30);
const DEFECT_LINE_STEP: i32 = 30;
const BANNER_SIZE: (u32, u32) = (100, 40);
const BANNER_MARGIN: i32 = 10;

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Colors, stroke width and font for overlays.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// TrueType/OpenType font for labels. `None` uses the bundled font.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Label height in pixels.
    pub text_scale: f32,
    pub line_thickness: u32,
    /// Used for OK status and measurement overlays.
    pub ok_color: [u8; 3],
    /// Used for NOK status and defect messages.
    pub nok_color: [u8; 3],
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            text_scale: 20.0,
            line_thickness: 2,
            ok_color: [0, 255, 0],
            nok_color: [255, 0, 0],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("failed to read font {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font file {}", path.display())]
    InvalidFont { path: PathBuf },
    #[error("bundled label font failed to parse")]
    BundledFont,
}

/// Draws [`Inspection`] overlays with a fixed style.
pub struct Annotator {
    style: AnnotationStyle,
    font: FontArc,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("style", &self.style)
            .field("font_path", &self.style.font_path)
            .finish()
    }
}

impl Annotator {
    pub fn new(style: AnnotationStyle) -> Result<Self, AnnotateError> {
        let font = match &style.font_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|source| AnnotateError::Io {
                    path: path.clone(),
                    source,
                })?;
                FontArc::try_from_vec(bytes)
                    .map_err(|_| AnnotateError::InvalidFont { path: path.clone() })?
            }
            None => {
                FontArc::try_from_slice(BUNDLED_FONT).map_err(|_| AnnotateError::BundledFont)?
            }
        };
        Ok(Self { style, font })
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Render overlays onto a copy of `frame`.
    pub fn annotate(&self, frame: &RgbImage, inspection: &Inspection) -> RgbImage {
        let mut canvas = frame.clone();
        let ok = Rgb(self.style.ok_color);
        let nok = Rgb(self.style.nok_color);

        for hole in &inspection.features.holes {
            self.draw_hole(&mut canvas, hole, ok);
        }
        if let Some(grid) = &inspection.grid {
            self.draw_seams(&mut canvas, grid, ok);
        }

        let status = inspection.verdict.status;
        self.draw_banner(&mut canvas, status, if status.is_ok() { ok } else { nok });

        if status == Status::Nok {
            let (x, mut y) = DEFECT_TEXT_ORIGIN;
            for defect in &inspection.verdict.defects {
                self.label(&mut canvas, x, y, &defect.to_string(), nok);
                y += DEFECT_LINE_STEP;
            }
        }
        canvas
    }

    fn label(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        draw_text_mut(
            canvas,
            color,
            x,
            y,
            PxScale::from(self.style.text_scale),
            &self.font,
            text,
        );
    }

    fn draw_hole(&self, canvas: &mut RgbImage, hole: &Hole, color: Rgb<u8>) {
        let r = hole.radius().round() as i32;
        for t in 0..self.style.line_thickness.max(1) as i32 {
            if r + t > 0 {
                draw_hollow_circle_mut(canvas, hole.center, r + t, color);
            }
        }
        let (cx, cy) = hole.center;
        self.label(canvas, cx - 40, cy - 10, &format!("D: {:.2}", hole.diameter()), color);
    }

    fn draw_seams(&self, canvas: &mut RgbImage, grid: &HoleGrid, color: Rgb<u8>) {
        let seams = grid.seams();
        let pairs = [
            (&grid.top_left, &grid.top_right, seams.top),
            (&grid.bottom_left, &grid.bottom_right, seams.bottom),
            (&grid.top_left, &grid.bottom_left, seams.left),
            (&grid.top_right, &grid.bottom_right, seams.right),
        ];
        for (i, (a, b, length)) in pairs.into_iter().enumerate() {
            let (start, end) = edge_segment(a, b, i < 2);
            self.thick_line(canvas, start, end, color);

            let mid = (
                ((start.0 + end.0) * 0.5) as i32,
                ((start.1 + end.1) * 0.5) as i32,
            );
            let pos = match i {
                0 => (mid.0, start.1 as i32 - 10),
                1 => (mid.0, start.1 as i32 + 15),
                2 => (start.0 as i32 - 50, mid.1),
                _ => (start.0 as i32 + 10, mid.1),
            };
            self.label(canvas, pos.0, pos.1, &format!("{length:.2}"), color);
        }
    }

    fn thick_line(&self, canvas: &mut RgbImage, start: (f32, f32), end: (f32, f32), color: Rgb<u8>) {
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-3 {
            return;
        }
        let (nx, ny) = (-dy / len, dx / len);
        let t = self.style.line_thickness.max(1) as i32;
        for k in 0..t {
            let off = k as f32 - (t - 1) as f32 * 0.5;
            draw_line_segment_mut(
                canvas,
                (start.0 + nx * off, start.1 + ny * off),
                (end.0 + nx * off, end.1 + ny * off),
                color,
            );
        }
    }

    fn draw_banner(&self, canvas: &mut RgbImage, status: Status, color: Rgb<u8>) {
        let (w, _) = canvas.dimensions();
        let (bw, bh) = BANNER_SIZE;
        if w <= bw + BANNER_MARGIN as u32 {
            return;
        }
        let x = w as i32 - bw as i32 - BANNER_MARGIN;
        draw_filled_rect_mut(canvas, Rect::at(x, BANNER_MARGIN).of_size(bw, bh), color);
        self.label(canvas, x + 10, BANNER_MARGIN + 8, status.as_str(), Rgb([0, 0, 0]));
    }
}

/// Seam segment from `a` to `b`, each end offset by its hole's radius along
/// x for horizontal seams and along y for vertical ones.
fn edge_segment(a: &Hole, b: &Hole, horizontal: bool) -> ((f32, f32), (f32, f32)) {
    let [ax, ay] = a.center_xy();
    let [bx, by] = b.center_xy();
    let (ra, rb) = (a.radius(), b.radius());
    let (start, end) = if horizontal {
        ((ax + ra, ay), (bx - rb, by))
    } else {
        ((ax, ay + ra), (bx, by - rb))
    };
    (
        (start.0 as f32, start.1 as f32),
        (end.0 as f32, end.1 as f32),
    )
}
