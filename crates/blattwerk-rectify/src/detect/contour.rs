// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour-based page-boundary detection: rank external contours by area,
// approximate the largest as polygons, and accept the first 4-vertex
// candidate that looks like a perspective view of a rectangle.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point as IPoint;
use tracing::{debug, instrument};

use blattwerk_core::{Detection, Point, Quad, RectifyOptions};

use super::QuadDetector;

/// How many of the largest contours are examined before giving up.
/// Smaller contours past this rank are assumed to be noise.
const MAX_CANDIDATES: usize = 5;

/// Perimeter fraction used as the Douglas-Peucker tolerance.
const APPROX_EPSILON_RATIO: f64 = 0.02;

/// Detects the page boundary by contour ranking and geometric validity rules.
///
/// Cheap and usually sufficient; the engine escalates to the Hough detector
/// when this one reports `found = false`.
#[derive(Debug, Default)]
pub struct ContourQuadDetector;

impl ContourQuadDetector {
    pub fn new() -> Self {
        Self
    }

    /// A 4-vertex candidate is valid iff it covers enough of the frame and
    /// its interior angles stay within a tight spread. The spread admits
    /// perspective distortion but rejects skewed non-rectangular quads.
    fn is_valid(quad: &Quad, frame_area: f32, opts: &RectifyOptions) -> bool {
        if quad.area() < frame_area * opts.min_area_ratio {
            return false;
        }
        quad.angle_range() < opts.max_angle_range_deg
    }
}

impl QuadDetector for ContourQuadDetector {
    fn name(&self) -> &'static str {
        "contour"
    }

    #[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
    fn detect(&self, edges: &GrayImage, opts: &RectifyOptions) -> Detection {
        let (width, height) = edges.dimensions();
        let frame_area = (width * height) as f32;

        let contours = find_contours::<i32>(edges);
        debug!(contour_count = contours.len(), "Contours extracted");

        // External contours only, ranked by enclosed area, top candidates.
        let mut outer: Vec<&[IPoint<i32>]> = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .map(|c| c.points.as_slice())
            .filter(|points| points.len() >= 4)
            .collect();
        outer.sort_by(|a, b| {
            polygon_area(b)
                .partial_cmp(&polygon_area(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (rank, points) in outer.into_iter().take(MAX_CANDIDATES).enumerate() {
            let perimeter = arc_length(points, true);
            let approx =
                approximate_polygon_dp(points, perimeter * APPROX_EPSILON_RATIO, true);
            if approx.len() != 4 {
                debug!(rank, vertices = approx.len(), "Candidate is not a quadrilateral");
                continue;
            }

            let quad = Quad::ordered([
                Point::new(approx[0].x as f32, approx[0].y as f32),
                Point::new(approx[1].x as f32, approx[1].y as f32),
                Point::new(approx[2].x as f32, approx[2].y as f32),
                Point::new(approx[3].x as f32, approx[3].y as f32),
            ]);

            if Self::is_valid(&quad, frame_area, opts) {
                debug!(
                    rank,
                    area = quad.area(),
                    angle_range = quad.angle_range(),
                    "Valid page boundary found"
                );
                return Detection::found(quad);
            }
            debug!(
                rank,
                area = quad.area(),
                angle_range = quad.angle_range(),
                "Candidate rejected by validity rules"
            );
        }

        debug!("No valid boundary among the top contours");
        Detection::not_found()
    }
}

/// Enclosed area of a closed pixel contour, via the shoelace formula.
fn polygon_area(points: &[IPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

// -- Tests --------------------------------------------------------------------
