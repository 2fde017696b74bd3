// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: size the output from the detected quadrilateral
// and warp the source into a flattened top-down view.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

use blattwerk_core::{BlattwerkError, Quad, Result};

/// Flattens a page given its canonical `[TL, TR, BR, BL]` boundary.
#[derive(Debug, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    pub fn new() -> Self {
        Self
    }

    /// Output dimensions implied by the quadrilateral: the larger of each
    /// pair of opposite side lengths. Using the larger side avoids cropping
    /// when the captured quadrilateral is itself slightly trapezoidal.
    ///
    /// Always at least 1x1 for a non-degenerate quad.
    pub fn output_dimensions(quad: &Quad) -> (u32, u32) {
        let tl = quad.top_left();
        let tr = quad.top_right();
        let br = quad.bottom_right();
        let bl = quad.bottom_left();

        let width = bl.distance(&br).max(tl.distance(&tr));
        let height = tl.distance(&bl).max(tr.distance(&br));
        ((width as u32).max(1), (height as u32).max(1))
    }

    /// Warp `source` so that `quad` maps onto the upright rectangle
    /// `[(0,0), (W−1,0), (W−1,H−1), (0,H−1)]`.
    ///
    /// `quad` must be in canonical order and expressed in `source`
    /// coordinates. Fails with `DegenerateGeometry` when three corners are
    /// collinear or no projective transform exists for the correspondence.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn rectify(&self, source: &GrayImage, quad: &Quad) -> Result<GrayImage> {
        if quad.is_degenerate() {
            return Err(BlattwerkError::DegenerateGeometry(
                "three or more corners are collinear".into(),
            ));
        }

        let (out_w, out_h) = Self::output_dimensions(quad);
        debug!(out_w, out_h, "Output dimensions computed");

        let src: [(f32, f32); 4] = [
            (quad.top_left().x, quad.top_left().y),
            (quad.top_right().x, quad.top_right().y),
            (quad.bottom_right().x, quad.bottom_right().y),
            (quad.bottom_left().x, quad.bottom_left().y),
        ];
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            ((out_w - 1) as f32, 0.0),
            ((out_w - 1) as f32, (out_h - 1) as f32),
            (0.0, (out_h - 1) as f32),
        ];

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            BlattwerkError::DegenerateGeometry(
                "no projective transform exists for the detected corners".into(),
            )
        })?;

        let mut output = GrayImage::new(out_w, out_h);
        warp_into(
            source,
            &projection,
            Interpolation::Bilinear,
            Luma([255u8]),
            &mut output,
        );
        debug!("Perspective warp applied");
        Ok(output)
    }
}

// -- Tests --------------------------------------------------------------------
