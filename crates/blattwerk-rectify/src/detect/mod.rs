// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-boundary detection strategies. Both detectors consume a binary edge
// map and produce a `Detection`; escalation between them is the engine's
// decision, not theirs.

pub mod contour;
pub mod hough;

use image::GrayImage;

use blattwerk_core::{Detection, RectifyOptions};

pub use contour::ContourQuadDetector;
pub use hough::HoughQuadDetector;

/// A strategy that extracts a 4-sided page-boundary candidate from a binary
/// edge map.
///
/// `Detection::found == false` means "no sufficiently valid boundary here" —
/// a normal outcome the orchestrator answers with its fallback policy.
pub trait QuadDetector {
    /// Strategy name used in log output.
    fn name(&self) -> &'static str;

    /// Attempt to locate the page boundary in `edges`.
    fn detect(&self, edges: &GrayImage, opts: &RectifyOptions) -> Detection;
}
