// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-rectify — Document rectification engine.
//
// Given one still frame of a physical page, locates the page's quadrilateral
// boundary (contour ranking first, Hough line voting as fallback), flattens
// it with a perspective warp, and produces a sharpened, binarized rendering
// suitable for downstream text extraction. Image decoding, OCR, and any
// file or CLI surface are the caller's concern.

pub mod detect;
pub mod edgemap;
pub mod engine;
pub mod postprocess;
pub mod warp;

// Re-export the primary types so callers can use `blattwerk_rectify::RectificationEngine` etc.
pub use detect::{ContourQuadDetector, HoughQuadDetector, QuadDetector};
pub use edgemap::EdgeMapBuilder;
pub use engine::{RectificationEngine, RectifiedPage};
pub use postprocess::PostProcessor;
pub use warp::PerspectiveRectifier;

pub use blattwerk_core::{BlattwerkError, Detection, Point, PolarLine, Quad, RectifyOptions, Result};
