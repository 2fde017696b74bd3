// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration. All knobs carry defaults tuned for hand-held photos
// of A-series paper, so zero-configuration calls succeed.

use serde::{Deserialize, Serialize};

use crate::error::{BlattwerkError, Result};

/// Tuning parameters for the rectification pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectifyOptions {
    /// Minimum candidate area as a fraction of the frame area, in (0, 1].
    /// Rejects small internal shapes (tables, photos on the page).
    pub min_area_ratio: f32,
    /// Maximum spread between the largest and smallest interior angle of a
    /// candidate, in degrees. Admits perspective distortion but not
    /// arbitrary quadrilaterals.
    pub max_angle_range_deg: f32,
    /// Gaussian blur kernel size (odd) for the contour-path edge map.
    pub contour_blur_kernel: u32,
    /// Canny low/high thresholds for the contour-path edge map. The low
    /// threshold must be strictly positive.
    pub contour_canny: (f32, f32),
    /// Square structuring element size (odd) for the morphological close
    /// that bridges glare/shadow gaps on the page boundary.
    pub morph_kernel: u32,
    /// Canny low/high thresholds for the Hough-path edge map.
    pub hough_canny: (f32, f32),
    /// Starting vote threshold for Hough line detection.
    pub hough_initial_threshold: u32,
    /// Vote-threshold decrement applied per search attempt.
    pub hough_threshold_step: u32,
    /// Vote threshold never drops below this floor.
    pub hough_min_threshold_floor: u32,
    /// Hard cap on threshold-search attempts, bounding worst-case latency.
    pub hough_max_attempts: u32,
    /// The search stops as soon as at least this many lines are found.
    pub hough_min_lines: usize,
    /// Unsharp-mask weights applied to (original, blurred).
    pub sharpen_weights: (f32, f32),
    /// Gaussian sigma of the blur used by the unsharp mask.
    pub sharpen_sigma: f32,
    /// Adaptive-threshold block size (odd, ≥ 3).
    pub threshold_block_size: u32,
    /// Constant subtracted from the local mean when thresholding.
    pub threshold_offset: i32,
    /// Height the frame is downscaled to before contour detection. Detected
    /// corners are scaled back into source coordinates.
    pub working_height: u32,
}

impl Default for RectifyOptions {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.25,
            max_angle_range_deg: 40.0,
            contour_blur_kernel: 7,
            contour_canny: (42.0, 84.0),
            morph_kernel: 9,
            hough_canny: (100.0, 200.0),
            hough_initial_threshold: 300,
            hough_threshold_step: 10,
            hough_min_threshold_floor: 10,
            hough_max_attempts: 30,
            hough_min_lines: 8,
            sharpen_weights: (1.5, -0.5),
            sharpen_sigma: 3.0,
            threshold_block_size: 21,
            threshold_offset: 15,
            working_height: 500,
        }
    }
}

impl RectifyOptions {
    /// Reject out-of-range parameters before any image work begins.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_area_ratio > 0.0 && self.min_area_ratio <= 1.0) {
            return Err(BlattwerkError::InvalidInput(format!(
                "min_area_ratio must be in (0, 1], got {}",
                self.min_area_ratio
            )));
        }
        if self.max_angle_range_deg <= 0.0 {
            return Err(BlattwerkError::InvalidInput(format!(
                "max_angle_range_deg must be positive, got {}",
                self.max_angle_range_deg
            )));
        }
        if self.contour_blur_kernel % 2 == 0 || self.contour_blur_kernel == 0 {
            return Err(BlattwerkError::InvalidInput(format!(
                "contour_blur_kernel must be odd, got {}",
                self.contour_blur_kernel
            )));
        }
        if self.morph_kernel % 2 == 0 || self.morph_kernel == 0 {
            return Err(BlattwerkError::InvalidInput(format!(
                "morph_kernel must be odd, got {}",
                self.morph_kernel
            )));
        }
        for (name, (low, high)) in [
            ("contour_canny", self.contour_canny),
            ("hough_canny", self.hough_canny),
        ] {
            if low <= 0.0 {
                return Err(BlattwerkError::InvalidInput(format!(
                    "{name} low threshold must be positive, got {low}"
                )));
            }
            if low > high {
                return Err(BlattwerkError::InvalidInput(format!(
                    "{name} low threshold {low} exceeds high threshold {high}"
                )));
            }
        }
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return Err(BlattwerkError::InvalidInput(format!(
                "threshold_block_size must be an odd integer >= 3, got {}",
                self.threshold_block_size
            )));
        }
        if self.hough_max_attempts == 0 {
            return Err(BlattwerkError::InvalidInput(
                "hough_max_attempts must be at least 1".into(),
            ));
        }
        if self.hough_min_lines < 4 {
            return Err(BlattwerkError::InvalidInput(format!(
                "hough_min_lines must be at least 4, got {}",
                self.hough_min_lines
            )));
        }
        if self.working_height == 0 {
            return Err(BlattwerkError::InvalidInput(
                "working_height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

// -- Tests --------------------------------------------------------------------
