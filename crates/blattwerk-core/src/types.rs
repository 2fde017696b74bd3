// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry types for the Blattwerk rectification engine: image-space
// points, page-boundary quadrilaterals, Hough lines in normal form, and the
// detection outcome passed between detectors and the orchestrator.

use serde::{Deserialize, Serialize};

/// An image-space coordinate. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Angle (in degrees) between two 2D vectors, via the dot-product formula.
fn angle_between_degrees(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
    let dot = (ux * vx + uy * vy) as f64;
    let norm_u = ((ux * ux + uy * uy) as f64).sqrt();
    let norm_v = ((vx * vx + vy * vy) as f64).sqrt();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    ((dot / (norm_u * norm_v)).clamp(-1.0, 1.0).acos()).to_degrees() as f32
}

/// Angle (in degrees) at `p2` formed by the segments `p2→p1` and `p2→p3`.
pub fn interior_angle(p1: Point, p2: Point, p3: Point) -> f32 {
    angle_between_degrees(p1.x - p2.x, p1.y - p2.y, p3.x - p2.x, p3.y - p2.y)
}

/// A four-point polygon approximating a document's visible boundary.
///
/// A `Quad` produced by a detector is unordered; [`Quad::ordered`] yields the
/// canonical `[top-left, top-right, bottom-right, bottom-left]` arrangement
/// that the perspective math relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Canonicalize four unordered points as `[TL, TR, BR, BL]`.
    ///
    /// Uses the sum/difference method. With image y pointing down:
    /// top-left minimises x+y, bottom-right maximises x+y, top-right
    /// maximises x−y, bottom-left minimises x−y.
    /// Idempotent: ordering an already-ordered quad returns the same quad.
    pub fn ordered(points: [Point; 4]) -> Self {
        let key = |p: &Point| p.x + p.y;
        let diff = |p: &Point| p.x - p.y;

        let mut tl = points[0];
        let mut br = points[0];
        let mut tr = points[0];
        let mut bl = points[0];
        for p in &points[1..] {
            if key(p) < key(&tl) {
                tl = *p;
            }
            if key(p) > key(&br) {
                br = *p;
            }
            if diff(p) > diff(&tr) {
                tr = *p;
            }
            if diff(p) < diff(&bl) {
                bl = *p;
            }
        }
        Self {
            corners: [tl, tr, br, bl],
        }
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Polygon area via the shoelace formula. Corners must be in order
    /// (CW or CCW); the result is orientation-independent.
    pub fn area(&self) -> f32 {
        let c = &self.corners;
        let mut area = 0.0f32;
        for i in 0..4 {
            let j = (i + 1) % 4;
            area += c[i].x * c[j].y;
            area -= c[j].x * c[i].y;
        }
        area.abs() / 2.0
    }

    /// Spread between the largest and smallest interior angle, in degrees.
    ///
    /// Expects corners in canonical `[TL, TR, BR, BL]` order. A perspective
    /// photo of a rectangle keeps this spread small; arbitrary quadrilaterals
    /// do not.
    pub fn angle_range(&self) -> f32 {
        let [tl, tr, br, bl] = self.corners;
        let upper_right = interior_angle(tl, tr, br);
        let upper_left = interior_angle(bl, tl, tr);
        let lower_right = interior_angle(tr, br, bl);
        let lower_left = interior_angle(br, bl, tl);

        let max = upper_right
            .max(upper_left)
            .max(lower_right.max(lower_left));
        let min = upper_right
            .min(upper_left)
            .min(lower_right.min(lower_left));
        max - min
    }

    /// True if any three corners are (near-)collinear, which makes the
    /// output width/height computation meaningless.
    pub fn is_degenerate(&self) -> bool {
        const EPS: f32 = 1e-3;
        let c = &self.corners;
        for i in 0..4 {
            let a = c[i];
            let b = c[(i + 1) % 4];
            let d = c[(i + 2) % 4];
            let cross = (b.x - a.x) * (d.y - a.y) - (b.y - a.y) * (d.x - a.x);
            if cross.abs() < EPS {
                return true;
            }
        }
        false
    }

    /// Scale every corner by a uniform factor (used to map detections on a
    /// downscaled working frame back into source coordinates).
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            corners: self
                .corners
                .map(|p| Point::new(p.x * factor, p.y * factor)),
        }
    }
}

/// A line in Hough normal form: `x·cos(theta) + y·sin(theta) = rho`,
/// with `theta` in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarLine {
    pub rho: f32,
    pub theta: f32,
}

impl PolarLine {
    pub fn new(rho: f32, theta: f32) -> Self {
        Self { rho, theta }
    }

    /// The same line with `theta` normalised to `[-pi/2, pi/2)` and `rho`
    /// sign-flipped to compensate. Two detections of one physical edge then
    /// compare equal parameter-wise regardless of which half-turn the
    /// accumulator reported.
    pub fn sign_adjusted(&self) -> Self {
        let half_pi = std::f32::consts::FRAC_PI_2;
        let mut rho = self.rho;
        let mut theta = self.theta;
        while theta >= half_pi {
            theta -= std::f32::consts::PI;
            rho = -rho;
        }
        while theta < -half_pi {
            theta += std::f32::consts::PI;
            rho = -rho;
        }
        Self { rho, theta }
    }

    /// Algebraic intersection of two lines in normal form.
    ///
    /// Returns `None` when the pair is near-parallel (`|Δtheta| ≤ 1.3` rad —
    /// the intersection would be numerically unstable and is never a useful
    /// page corner) or when the determinant is near-singular.
    pub fn intersect(&self, other: &PolarLine) -> Option<Point> {
        if (self.theta - other.theta).abs() <= 1.3 {
            return None;
        }

        let (cos1, sin1) = ((self.theta as f64).cos(), (self.theta as f64).sin());
        let (cos2, sin2) = ((other.theta as f64).cos(), (other.theta as f64).sin());
        let det = cos1 * sin2 - sin1 * cos2;
        if det.abs() < 1e-10 {
            return None;
        }

        let rho1 = self.rho as f64;
        let rho2 = other.rho as f64;
        let x = (rho1 * sin2 - sin1 * rho2) / det;
        let y = (cos1 * rho2 - rho1 * cos2) / det;
        Some(Point::new(x as f32, y as f32))
    }
}

/// Outcome of one quadrilateral-detection attempt.
///
/// `found = false` is a normal result, not an error: it tells the
/// orchestrator to escalate to the next strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub quad: Quad,
    pub found: bool,
}

impl Detection {
    /// A successful detection carrying the candidate boundary.
    pub fn found(quad: Quad) -> Self {
        Self { quad, found: true }
    }

    /// No sufficiently valid boundary was located.
    pub fn not_found() -> Self {
        let origin = Point::new(0.0, 0.0);
        Self {
            quad: Quad::new([origin; 4]),
            found: false,
        }
    }
}

// -- Tests --------------------------------------------------------------------
