use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use weldinspect::{
    detect_holes, detect_spatter, extract_features, inspect_frame, InspectionConfig,
};

fn fill_disc(img: &mut GrayImage, cx: f32, cy: f32, r: f32, v: u8) {
    let (w, h) = img.dimensions();
    let x0 = (cx - r).floor().max(0.0) as u32;
    let x1 = (cx + r).ceil().min((w - 1) as f32) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let y1 = (cy + r).ceil().min((h - 1) as f32) as u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }
}

/// Bright plate with four holes, weld bars and scattered droplets.
fn make_part_fixture(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    let margin = width.min(height) / 10;
    let mut rng = StdRng::seed_from_u64(seed);

    for y in margin..height - margin {
        for x in margin..width - margin {
            let noise = rng.gen_range(-3i16..=3);
            img.put_pixel(x, y, Luma([(228 + noise) as u8]));
        }
    }

    let pw = (width - 2 * margin) as f32;
    let ph = (height - 2 * margin) as f32;
    let r = 20.0;
    let centers: Vec<(f32, f32)> = [(0.25, 0.3), (0.75, 0.3), (0.25, 0.7), (0.75, 0.7)]
        .iter()
        .map(|&(fx, fy)| (margin as f32 + fx * pw, margin as f32 + fy * ph))
        .collect();
    for &(cx, cy) in &centers {
        fill_disc(&mut img, cx, cy, r, 0);
    }

    for _ in 0..40 {
        let x = rng.gen_range(margin as f32 + 10.0..(width - margin) as f32 - 10.0);
        let y = rng.gen_range(margin as f32 + 10.0..(height - margin) as f32 - 10.0);
        if centers
            .iter()
            .any(|&(cx, cy)| (x - cx).hypot(y - cy) < r + 12.0)
        {
            continue;
        }
        fill_disc(&mut img, x, y, rng.gen_range(3.0f32..5.0), 30);
    }
    img
}

fn bench_detectors(c: &mut Criterion) {
    let cfg = InspectionConfig::default();
    let img = make_part_fixture(640, 480, 7);

    c.bench_function("holes_640x480", |b| {
        b.iter(|| black_box(detect_holes(black_box(&img), black_box(&cfg.holes)).len()))
    });

    c.bench_function("spatter_640x480", |b| {
        b.iter(|| black_box(detect_spatter(black_box(&img), black_box(&cfg.spatter))))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let cfg = InspectionConfig::default();
    let img_640 = make_part_fixture(640, 480, 11);
    let img_1280 = make_part_fixture(1280, 960, 13);

    c.bench_function("extract_features_640x480", |b| {
        b.iter(|| black_box(extract_features(black_box(&img_640), black_box(&cfg))))
    });

    c.bench_function("inspect_frame_1280x960", |b| {
        b.iter(|| black_box(inspect_frame(black_box(&img_1280), black_box(&cfg))))
    });
}

criterion_group!(extract, bench_detectors, bench_pipeline);
criterion_main!(extract);
