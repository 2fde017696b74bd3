// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the rectification pipeline. Covers the full
// engine on a synthetic page frame and the contour detector in isolation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use blattwerk_core::RectifyOptions;
use blattwerk_rectify::detect::{ContourQuadDetector, QuadDetector};
use blattwerk_rectify::edgemap::EdgeMapBuilder;
use blattwerk_rectify::engine::RectificationEngine;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Synthetic page frame: a white rectangle filling most of a dark background,
/// the same pattern used in the engine's end-to-end test.
fn synthetic_page(width: u32, height: u32) -> DynamicImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([20u8]));
    let (x0, y0) = (width / 10, height / 10);
    let (x1, y1) = (width - x0, height - y0);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Luma([245u8]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full pipeline on a 640x480 synthetic frame: edge map, contour detection,
/// warp, sharpen, adaptive threshold.
fn bench_full_rectify(c: &mut Criterion) {
    let frame = synthetic_page(640, 480);
    let engine = RectificationEngine::new();

    c.bench_function("rectify full pipeline (640x480)", |b| {
        b.iter(|| {
            let page = engine.rectify(black_box(&frame)).expect("detectable page");
            black_box(page.image);
        });
    });
}

/// Contour detection alone on a precomputed edge map.
fn bench_contour_detection(c: &mut Criterion) {
    let frame = synthetic_page(640, 480);
    let opts = RectifyOptions::default();
    let edges = EdgeMapBuilder::new(&opts).contour_edges(&frame.to_luma8());
    let detector = ContourQuadDetector::new();

    c.bench_function("contour detection (640x480 edge map)", |b| {
        b.iter(|| {
            let detection = detector.detect(black_box(&edges), &opts);
            black_box(detection);
        });
    });
}

criterion_group!(benches, bench_full_rectify, bench_contour_detection);
criterion_main!(benches);
