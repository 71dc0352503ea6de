//! Hough-gradient circle transform for mounting-hole detection.
//!
//! Every Canny edge pixel votes along its gradient direction (both signs) at
//! each radius in `[min_radius_px, max_radius_px]`. Circle boundaries produce
//! accumulator peaks at their centers because gradient vectors along a circle
//! converge radially. Each surviving center then gets its radius from the
//! distance histogram of the surrounding edge pixels.

use image::GrayImage;

/// Configuration for circular hole detection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HoleDetectConfig {
    /// Gaussian sigma of the pre-smoothing pass (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    /// Inverse accumulator resolution: 1.0 votes at image resolution,
    /// 2.0 at half resolution.
    pub accumulator_resolution: f32,
    /// Minimum distance between accepted hole centers (pixels).
    pub min_center_distance_px: f32,
    /// Upper Canny threshold; the lower threshold is half of it.
    pub edge_threshold: f32,
    /// Votes a center needs, and edge support a radius needs, to be accepted.
    pub center_threshold: u32,
    /// Smallest hole radius searched (pixels).
    pub min_radius_px: u32,
    /// Largest hole radius searched (pixels).
    pub max_radius_px: u32,
}

impl Default for HoleDetectConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            accumulator_resolution: 1.0,
            min_center_distance_px: 50.0,
            edge_threshold: 50.0,
            center_threshold: 20,
            min_radius_px: 10,
            max_radius_px: 40,
        }
    }
}

/// A detected mounting hole.
///
/// Circular detection yields `width == height`; the two axes are kept apart
/// so an ellipse fit can fill them independently.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Hole {
    /// Center (x, y) in image pixels.
    pub center: (i32, i32),
    /// Horizontal extent (pixels).
    pub width: f64,
    /// Vertical extent (pixels).
    pub height: f64,
}

impl Hole {
    /// Circular hole with the given diameter.
    pub fn circular(center: (i32, i32), diameter: f64) -> Self {
        Self {
            center,
            width: diameter,
            height: diameter,
        }
    }

    /// Radius used for seam geometry (`width / 2`).
    pub fn radius(&self) -> f64 {
        self.width / 2.0
    }

    pub fn diameter(&self) -> f64 {
        self.width
    }

    pub fn center_xy(&self) -> [f64; 2] {
        [self.center.0 as f64, self.center.1 as f64]
    }
}

#[derive(Debug, Clone, Copy)]
struct EdgePoint {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, Copy)]
struct RadiusSupport {
    radius: f32,
    count: usize,
}

/// Pick the 1-px distance band with the best support-per-radius ratio.
///
/// `dists` is sorted in place.
fn best_radius(dists: &mut [f32], bin_width: f32) -> Option<RadiusSupport> {
    if dists.is_empty() {
        return None;
    }
    dists.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(usize, usize)> = None;
    let mut best_score = 0.0f32;
    let mut end = 0;
    for start in 0..dists.len() {
        end = end.max(start);
        while end < dists.len() && dists[end] - dists[start] < bin_width {
            end += 1;
        }
        let count = end - start;
        let mid = 0.5 * (dists[start] + dists[end - 1]);
        let score = count as f32 / mid.max(1.0);
        if score > best_score {
            best_score = score;
            best = Some((start, end));
        }
    }

    let (s, e) = best?;
    let mean = dists[s..e].iter().sum::<f32>() / (e - s) as f32;
    Some(RadiusSupport {
        radius: mean,
        count: e - s,
    })
}

fn collect_edge_points(blurred: &GrayImage, edge_threshold: f32) -> Vec<EdgePoint> {
    let (w, _) = blurred.dimensions();
    let edges = imageproc::edges::canny(blurred, 0.5 * edge_threshold, edge_threshold);
    let gx = imageproc::gradients::horizontal_sobel(blurred);
    let gy = imageproc::gradients::vertical_sobel(blurred);
    let gx_raw = gx.as_raw();
    let gy_raw = gy.as_raw();

    let stride = w as usize;
    let mut points = Vec::new();
    for (idx, &e) in edges.as_raw().iter().enumerate() {
        if e == 0 {
            continue;
        }
        let gxv = gx_raw[idx] as f32;
        let gyv = gy_raw[idx] as f32;
        let mag = (gxv * gxv + gyv * gyv).sqrt();
        if mag < 1e-3 {
            continue;
        }
        points.push(EdgePoint {
            x: (idx % stride) as f32,
            y: (idx / stride) as f32,
            dx: gxv / mag,
            dy: gyv / mag,
        });
    }
    points
}

/// Detect circular holes in a greyscale frame.
///
/// Returns holes in acceptance order (strongest accumulator peak first).
/// No candidates yields an empty vector; the count is not capped here.
pub fn detect_holes(gray: &GrayImage, config: &HoleDetectConfig) -> Vec<Hole> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return Vec::new();
    }
    if config.max_radius_px < config.min_radius_px || config.accumulator_resolution <= 0.0 {
        return Vec::new();
    }

    let blurred = if config.blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(gray, config.blur_sigma)
    } else {
        gray.clone()
    };
    let edge_points = collect_edge_points(&blurred, config.edge_threshold);
    if edge_points.is_empty() {
        return Vec::new();
    }

    // Vote accumulation into a one-cell padded grid so the peak test below
    // never leaves the buffer.
    let dp = config.accumulator_resolution;
    let inv_dp = 1.0 / dp;
    let acols = (w as f32 * inv_dp).ceil() as usize;
    let arows = (h as f32 * inv_dp).ceil() as usize;
    let stride = acols + 2;
    let mut accum = vec![0u32; stride * (arows + 2)];
    let radii: Vec<f32> = (config.min_radius_px..=config.max_radius_px)
        .map(|r| r as f32)
        .collect();

    for p in &edge_points {
        for &r in &radii {
            for sign in [1.0f32, -1.0] {
                let vx = ((p.x + sign * p.dx * r) * inv_dp).round();
                let vy = ((p.y + sign * p.dy * r) * inv_dp).round();
                if vx < 0.0 || vy < 0.0 || vx >= acols as f32 || vy >= arows as f32 {
                    continue;
                }
                accum[(vy as usize + 1) * stride + vx as usize + 1] += 1;
            }
        }
    }

    // Local maxima above threshold; asymmetric comparisons break plateaus.
    let mut centers: Vec<(usize, usize, u32)> = Vec::new();
    for y in 0..arows {
        for x in 0..acols {
            let idx = (y + 1) * stride + x + 1;
            let v = accum[idx];
            if v > config.center_threshold
                && v > accum[idx - 1]
                && v >= accum[idx + 1]
                && v > accum[idx - stride]
                && v >= accum[idx + stride]
            {
                centers.push((x, y, v));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2));
    tracing::debug!("{} hole center candidates", centers.len());

    let min_r = config.min_radius_px as f32;
    let max_r = config.max_radius_px as f32;
    let min_dist_sq = config.min_center_distance_px * config.min_center_distance_px;
    let mut accepted: Vec<[f32; 2]> = Vec::new();
    let mut holes = Vec::new();
    let mut dists: Vec<f32> = Vec::with_capacity(edge_points.len());

    for (ax, ay, votes) in centers {
        let c = [ax as f32 * dp, ay as f32 * dp];
        let too_close = accepted.iter().any(|a| {
            let dx = a[0] - c[0];
            let dy = a[1] - c[1];
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }

        dists.clear();
        for p in &edge_points {
            let dx = p.x - c[0];
            let dy = p.y - c[1];
            let d = (dx * dx + dy * dy).sqrt();
            if d >= min_r && d <= max_r {
                dists.push(d);
            }
        }
        let Some(support) = best_radius(&mut dists, 1.0) else {
            continue;
        };
        if support.count as u32 <= config.center_threshold {
            tracing::trace!(
                "center ({:.0}, {:.0}) votes={} rejected: radius support {}",
                c[0],
                c[1],
                votes,
                support.count
            );
            continue;
        }

        accepted.push(c);
        let radius = support.radius.round() as f64;
        holes.push(Hole::circular(
            (c[0].round() as i32, c[1].round() as i32),
            2.0 * radius,
        ));
    }

    tracing::debug!("{} holes accepted", holes.len());
    holes
}
