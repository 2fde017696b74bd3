// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hough-based page-boundary detection: adaptive vote-threshold search,
// duplicate-line suppression, and pairwise polar-line intersection. Used as
// the fallback strategy on frames where contour detection fails (cluttered
// backgrounds, broken page edges).

use image::GrayImage;
use imageproc::hough::{LineDetectionOptions, detect_lines};
use tracing::{debug, instrument, warn};

use blattwerk_core::{Detection, Point, PolarLine, Quad, RectifyOptions};

use super::QuadDetector;

/// Non-maximum suppression radius passed to the Hough accumulator.
const SUPPRESSION_RADIUS: u32 = 8;

/// Two lines within this rho distance (pixels) and theta distance (radians)
/// of each other, after sign adjustment, are duplicates of one physical edge.
const DUP_RHO_TOLERANCE: f32 = 50.0;
const DUP_THETA_TOLERANCE: f32 = 0.5;

/// Detects the page boundary by straight-line voting and corner
/// reconstruction from line intersections.
///
/// More expensive than the contour detector and deliberately stricter on
/// failure: when fewer than four in-bounds intersections exist, the geometry
/// is too broken for any fallback guess, so the detector reports
/// `found = false` and leaves the decision to the engine.
#[derive(Debug, Default)]
pub struct HoughQuadDetector;

impl HoughQuadDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run line detection repeatedly, lowering the vote threshold each
    /// attempt, until enough distinct lines are found or the attempt cap is
    /// hit.
    ///
    /// A fixed threshold is not robust across lighting and contrast
    /// conditions; the cap keeps the search bounded and worst-case latency
    /// deterministic. Line counts are compared after duplicate suppression,
    /// and the first attempt that yields at least four distinct lines is
    /// remembered: if the target count is never reached, that
    /// highest-threshold set wins over whatever low-vote clutter the final
    /// attempts accumulate.
    fn search_lines(&self, edges: &GrayImage, opts: &RectifyOptions) -> Vec<PolarLine> {
        let mut threshold = opts.hough_initial_threshold;
        let mut strongest: Vec<PolarLine> = Vec::new();
        let mut unique: Vec<PolarLine> = Vec::new();

        for attempt in 0..opts.hough_max_attempts {
            let detected = detect_lines(
                edges,
                LineDetectionOptions {
                    vote_threshold: threshold,
                    suppression_radius: SUPPRESSION_RADIUS,
                },
            );
            let lines: Vec<PolarLine> = detected
                .iter()
                .map(|l| PolarLine::new(l.r, (l.angle_in_degrees as f32).to_radians()))
                .collect();
            unique = Self::dedup_lines(&lines);
            debug!(
                attempt,
                threshold,
                raw = lines.len(),
                unique = unique.len(),
                "Hough attempt"
            );

            if unique.len() >= opts.hough_min_lines {
                return unique;
            }
            if strongest.len() < 4 && unique.len() >= 4 {
                strongest = unique.clone();
            }
            threshold = threshold
                .saturating_sub(opts.hough_threshold_step)
                .max(opts.hough_min_threshold_floor);
        }

        if strongest.len() >= 4 { strongest } else { unique }
    }

    /// Drop lines whose sign-adjusted normal-form parameters are
    /// near-identical to a later line's; only one detection per physical
    /// edge survives.
    fn dedup_lines(lines: &[PolarLine]) -> Vec<PolarLine> {
        let adjusted: Vec<PolarLine> = lines.iter().map(|l| l.sign_adjusted()).collect();
        let mut unique = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let a = adjusted[i];
            let duplicate = adjusted[i + 1..].iter().any(|b| {
                (b.rho - a.rho).abs() < DUP_RHO_TOLERANCE
                    && (b.theta - a.theta).abs() < DUP_THETA_TOLERANCE
            });
            if !duplicate {
                unique.push(*line);
            }
        }
        unique
    }

    /// Intersect every line pair, skipping near-parallel pairs, and keep
    /// intersections inside the frame.
    fn corner_candidates(lines: &[PolarLine], width: u32, height: u32) -> Vec<Point> {
        let mut corners = Vec::new();
        for i in 0..lines.len() {
            for j in i + 1..lines.len() {
                let Some(pt) = lines[i].intersect(&lines[j]) else {
                    continue;
                };
                if pt.x < 0.0 || pt.y < 0.0 || pt.x > width as f32 || pt.y > height as f32 {
                    continue;
                }
                corners.push(pt);
            }
        }
        corners
    }

    /// Pick the four intersections that bound the candidate region: extreme
    /// x+y picks top-left and bottom-right, extreme x−y picks top-right and
    /// bottom-left, the same convention `Quad::ordered` canonicalizes with.
    ///
    /// Interior intersections (text lines, rulings) can never out-score the
    /// outermost corners under these keys. `None` when two picks coincide,
    /// which means the intersections do not span a quadrilateral.
    fn select_corners(candidates: &[Point]) -> Option<Quad> {
        let mut tl = candidates[0];
        let mut tr = candidates[0];
        let mut br = candidates[0];
        let mut bl = candidates[0];
        for p in &candidates[1..] {
            if p.x + p.y < tl.x + tl.y {
                tl = *p;
            }
            if p.x + p.y > br.x + br.y {
                br = *p;
            }
            if p.x - p.y > tr.x - tr.y {
                tr = *p;
            }
            if p.x - p.y < bl.x - bl.y {
                bl = *p;
            }
        }

        let picks = [tl, tr, br, bl];
        for i in 0..4 {
            for j in i + 1..4 {
                if picks[i].distance(&picks[j]) < 1.0 {
                    return None;
                }
            }
        }

        let quad = Quad::new(picks);
        if quad.is_degenerate() { None } else { Some(quad) }
    }
}

impl QuadDetector for HoughQuadDetector {
    fn name(&self) -> &'static str {
        "hough"
    }

    #[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
    fn detect(&self, edges: &GrayImage, opts: &RectifyOptions) -> Detection {
        let (width, height) = edges.dimensions();

        let lines = self.search_lines(edges, opts);
        if lines.len() < 4 {
            warn!(line_count = lines.len(), "Too few Hough lines for a quadrilateral");
            return Detection::not_found();
        }

        let corners = Self::corner_candidates(&lines, width, height);
        debug!(corner_count = corners.len(), "In-bounds intersections found");

        if corners.len() < 4 {
            warn!(
                corner_count = corners.len(),
                "Fewer than four usable intersections"
            );
            return Detection::not_found();
        }

        match Self::select_corners(&corners) {
            Some(quad) => Detection::found(quad),
            None => {
                warn!("Intersections collapse to degenerate corners");
                Detection::not_found()
            }
        }
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Paint a 1px-wide axis-aligned rectangle outline into an edge map.
    fn rectangle_outline(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut edges = GrayImage::from_pixel(width, height, Luma([0u8]));
        for x in x0..=x1 {
            edges.put_pixel(x, y0, Luma([255u8]));
            edges.put_pixel(x, y1, Luma([255u8]));
        }
        for y in y0..=y1 {
            edges.put_pixel(x0, y, Luma([255u8]));
            edges.put_pixel(x1, y, Luma([255u8]));
        }
        edges
    }

    /// A clean rectangle outline yields four corners near ground truth.
    #[test]
    fn detects_rectangle_outline() {
        let edges = rectangle_outline(400, 300, 60, 50, 340, 250);
        let det = HoughQuadDetector::new().detect(&edges, &RectifyOptions::default());
        assert!(det.found, "expected four corners from a clean outline");

        let quad = Quad::ordered(det.quad.corners);
        let expected = [(60.0, 50.0), (340.0, 50.0), (340.0, 250.0), (60.0, 250.0)];
        for (corner, (ex, ey)) in quad.corners.iter().zip(expected) {
            assert!(
                (corner.x - ex).abs() <= 8.0 && (corner.y - ey).abs() <= 8.0,
                "corner {corner} too far from ({ex}, {ey})"
            );
        }
    }

    /// An empty edge map starves the threshold search; the detector reports
    /// `found = false` after the bounded number of attempts.
    #[test]
    fn empty_edge_map_reports_not_found() {
        let edges = GrayImage::from_pixel(200, 150, Luma([0u8]));
        let det = HoughQuadDetector::new().detect(&edges, &RectifyOptions::default());
        assert!(!det.found);
    }

    /// Two near-identical lines collapse to one after deduplication.
    #[test]
    fn dedup_collapses_near_identical_lines() {
        let lines = [
            PolarLine::new(100.0, 0.01),
            PolarLine::new(110.0, 0.02),
            PolarLine::new(300.0, std::f32::consts::FRAC_PI_2),
        ];
        let unique = HoughQuadDetector::dedup_lines(&lines);
        assert_eq!(unique.len(), 2);
    }

    /// Lines that agree in rho but differ strongly in theta are kept apart.
    #[test]
    fn dedup_keeps_distinct_orientations() {
        let lines = [
            PolarLine::new(100.0, 0.0),
            PolarLine::new(100.0, std::f32::consts::FRAC_PI_2),
        ];
        let unique = HoughQuadDetector::dedup_lines(&lines);
        assert_eq!(unique.len(), 2);
    }

    /// With interior rulings present (an extra vertical line through the
    /// middle), corner selection still picks the four outermost
    /// intersections.
    #[test]
    fn selects_outermost_intersections() {
        let lines = [
            PolarLine::new(60.0, 0.0),
            PolarLine::new(200.0, 0.0),
            PolarLine::new(340.0, 0.0),
            PolarLine::new(50.0, std::f32::consts::FRAC_PI_2),
            PolarLine::new(250.0, std::f32::consts::FRAC_PI_2),
        ];
        let candidates = HoughQuadDetector::corner_candidates(&lines, 400, 300);
        assert_eq!(candidates.len(), 6);

        let quad = HoughQuadDetector::select_corners(&candidates).expect("spanning corners");
        let expected = [(60.0, 50.0), (340.0, 50.0), (340.0, 250.0), (60.0, 250.0)];
        for (corner, (ex, ey)) in quad.corners.iter().zip(expected) {
            assert!(
                (corner.x - ex).abs() <= 1.0 && (corner.y - ey).abs() <= 1.0,
                "corner {corner} too far from ({ex}, {ey})"
            );
        }
    }

    /// Intersections clustered at one spot cannot span a quadrilateral;
    /// selection refuses rather than fabricating corners.
    #[test]
    fn clustered_intersections_rejected() {
        let candidates = [
            Point::new(100.0, 100.0),
            Point::new(100.2, 100.1),
            Point::new(99.8, 99.9),
        ];
        assert!(HoughQuadDetector::select_corners(&candidates).is_none());
    }

    /// Out-of-bounds intersections are discarded.
    #[test]
    fn corner_candidates_respect_bounds() {
        // x = 500 crosses y = 100 at (500, 100), outside a 400x300 frame.
        let lines = [
            PolarLine::new(500.0, 0.0),
            PolarLine::new(100.0, std::f32::consts::FRAC_PI_2),
        ];
        let corners = HoughQuadDetector::corner_candidates(&lines, 400, 300);
        assert!(corners.is_empty());
    }
}
