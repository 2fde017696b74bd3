// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orchestration: one `rectify` call runs detection (contour first, Hough as
// fallback), corner ordering, perspective warp, and post-processing. Two-tier
// escalation trades a fast heuristic against a more expensive one; when both
// fail the engine reports failure instead of guessing.

use image::{DynamicImage, GrayImage, imageops};
use tracing::{debug, info, instrument, warn};

use blattwerk_core::{BlattwerkError, Detection, Quad, RectifyOptions, Result};

use crate::detect::{ContourQuadDetector, HoughQuadDetector, QuadDetector};
use crate::edgemap::EdgeMapBuilder;
use crate::postprocess::PostProcessor;
use crate::warp::PerspectiveRectifier;

/// Final output of one rectification call.
#[derive(Debug, Clone)]
pub struct RectifiedPage {
    /// The flattened, sharpened, binarized page.
    pub image: GrayImage,
    /// The detected boundary in the *source* image's coordinate space
    /// (pre-rescale), canonically ordered — kept for traceability even
    /// though `image` is the rectified rendering.
    pub corners: Quad,
}

/// The document rectification engine.
///
/// A pure, synchronous pipeline: every call owns its intermediate buffers,
/// shares no state across calls, and is safe to run concurrently from
/// multiple threads. The only loop without an obvious bound — the Hough
/// vote-threshold search — is capped by `hough_max_attempts`.
#[derive(Debug, Default)]
pub struct RectificationEngine {
    opts: RectifyOptions,
    contour: ContourQuadDetector,
    hough: HoughQuadDetector,
}

impl RectificationEngine {
    /// Engine with the documented defaults; zero-configuration calls succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with caller-supplied tuning. Rejects out-of-range parameters
    /// up front so every later `rectify` call starts from a valid state.
    pub fn with_options(opts: RectifyOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            contour: ContourQuadDetector::new(),
            hough: HoughQuadDetector::new(),
        })
    }

    pub fn options(&self) -> &RectifyOptions {
        &self.opts
    }

    /// Locate the page in `frame`, flatten it to a top-down view, and
    /// binarize it for readability.
    ///
    /// Detection runs on a working copy downscaled to
    /// `options.working_height`; the returned corners are mapped back into
    /// `frame` coordinates. Fails with `NoBoundaryDetected` when both
    /// detection strategies come up empty — callers should re-prompt for a
    /// better capture rather than expect a degraded full-frame rendering.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn rectify(&self, frame: &DynamicImage) -> Result<RectifiedPage> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(BlattwerkError::InvalidInput(
                "frame has zero width or height".into(),
            ));
        }

        let gray = frame.to_luma8();
        let (working, ratio) = self.working_copy(&gray);
        debug!(
            working_w = working.width(),
            working_h = working.height(),
            ratio,
            "Working copy prepared"
        );

        let builder = EdgeMapBuilder::new(&self.opts);

        // Strategy A: contour ranking on the downscaled frame.
        let edges = builder.contour_edges(&working);
        let detection = self.run_strategy(&self.contour, &edges);
        let quad = if detection.found {
            detection.quad.scaled(ratio)
        } else {
            // Strategy B: Hough line voting at full resolution. Corners come
            // out in source coordinates directly.
            let edges = builder.hough_edges(&gray);
            let detection = self.run_strategy(&self.hough, &edges);
            if !detection.found {
                warn!("Both detection strategies failed");
                return Err(BlattwerkError::NoBoundaryDetected);
            }
            detection.quad
        };

        let ordered = Quad::ordered(quad.corners);
        info!(
            top_left = %ordered.top_left(),
            top_right = %ordered.top_right(),
            bottom_right = %ordered.bottom_right(),
            bottom_left = %ordered.bottom_left(),
            "Page boundary detected"
        );

        let warped = PerspectiveRectifier::new().rectify(&gray, &ordered)?;
        let cleaned = PostProcessor::new().clean(&warped, &self.opts);
        info!(
            out_w = cleaned.width(),
            out_h = cleaned.height(),
            "Rectification complete"
        );

        Ok(RectifiedPage {
            image: cleaned,
            corners: ordered,
        })
    }

    /// Downscale to the configured working height, preserving aspect ratio.
    /// Returns the working frame and the factor mapping working coordinates
    /// back to source coordinates.
    fn working_copy(&self, gray: &GrayImage) -> (GrayImage, f32) {
        let (w, h) = gray.dimensions();
        if h <= self.opts.working_height {
            return (gray.clone(), 1.0);
        }
        let target_h = self.opts.working_height;
        let target_w = ((w as u64 * target_h as u64) / h as u64).max(1) as u32;
        let working = imageops::resize(gray, target_w, target_h, imageops::FilterType::Triangle);
        (working, h as f32 / target_h as f32)
    }

    fn run_strategy(&self, detector: &dyn QuadDetector, edges: &GrayImage) -> Detection {
        let detection = detector.detect(edges, &self.opts);
        if detection.found {
            debug!(strategy = detector.name(), "Strategy succeeded");
        } else {
            debug!(strategy = detector.name(), "Strategy found no boundary");
        }
        detection
    }
}

// -- Tests --------------------------------------------------------------------
