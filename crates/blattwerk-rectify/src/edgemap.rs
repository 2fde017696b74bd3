// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-map construction — turns a grayscale frame into a binary edge map.
// Two fixed recipes: a gentle one feeding the contour detector and a more
// aggressive gap-closing one feeding the Hough detector.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

use blattwerk_core::RectifyOptions;

/// Radius of the square element used by the Hough-path dilate/erode pair.
/// Matches a 5x5 kernel applied for 5 iterations (a 21x21 element).
const HOUGH_MORPH_RADIUS: u32 = 10;

/// Blur kernel size used between the Hough-path dilate and erode.
const HOUGH_BLUR_KERNEL: u32 = 3;

/// Gaussian sigma equivalent to an OpenCV-style odd kernel of size `k`
/// with sigma left unspecified.
fn sigma_for_kernel(k: u32) -> f32 {
    0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Builds binary edge maps from grayscale frames.
///
/// Both recipes always succeed for non-degenerate input; edge-map quality,
/// not validity, is what varies with capture conditions.
pub struct EdgeMapBuilder<'a> {
    opts: &'a RectifyOptions,
}

impl<'a> EdgeMapBuilder<'a> {
    pub fn new(opts: &'a RectifyOptions) -> Self {
        Self { opts }
    }

    /// Edge map for the contour detector:
    /// blur → morphological close → Canny.
    ///
    /// Closing before edge detection bridges gaps caused by glare or shadow
    /// on the page boundary, trading a little corner sharpness for
    /// robustness.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn contour_edges(&self, gray: &GrayImage) -> GrayImage {
        let sigma = sigma_for_kernel(self.opts.contour_blur_kernel);
        let blurred = gaussian_blur_f32(gray, sigma);
        debug!(sigma, "Gaussian blur applied");

        let radius = self.opts.morph_kernel / 2;
        let closed = grayscale_close(&blurred, radius);
        debug!(kernel = self.opts.morph_kernel, "Morphological close applied");

        let (low, high) = self.opts.contour_canny;
        let edges = canny(&closed, low, high);
        debug!(low, high, "Canny edge detection complete");
        edges
    }

    /// Edge map for the Hough detector:
    /// dilate → blur → erode → Canny.
    ///
    /// The dilate/erode pair closes wider gaps than the contour recipe,
    /// which Hough voting needs to accumulate long straight edges.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn hough_edges(&self, gray: &GrayImage) -> GrayImage {
        let dilated = grayscale_dilate(gray, HOUGH_MORPH_RADIUS);
        let blurred = gaussian_blur_f32(&dilated, sigma_for_kernel(HOUGH_BLUR_KERNEL));
        let eroded = grayscale_erode(&blurred, HOUGH_MORPH_RADIUS);
        debug!(radius = HOUGH_MORPH_RADIUS, "Dilate/blur/erode applied");

        let (low, high) = self.opts.hough_canny;
        let edges = canny(&eroded, low, high);
        debug!(low, high, "Canny edge detection complete");
        edges
    }
}

// -- Grayscale morphology helpers ---------------------------------------------
//
// Square-element grayscale morphology as separable row/column max (dilate)
// and min (erode) passes. The window is clamped at the image border.

fn row_filter(gray: &GrayImage, radius: u32, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1);
            let mut value = gray.get_pixel(x0, y).0[0];
            for xi in x0 + 1..=x1 {
                value = pick(value, gray.get_pixel(xi, y).0[0]);
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

fn column_filter(gray: &GrayImage, radius: u32, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1);
        for x in 0..w {
            let mut value = gray.get_pixel(x, y0).0[0];
            for yi in y0 + 1..=y1 {
                value = pick(value, gray.get_pixel(x, yi).0[0]);
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// Grayscale dilation with a square element of side `2·radius + 1`.
fn grayscale_dilate(gray: &GrayImage, radius: u32) -> GrayImage {
    column_filter(&row_filter(gray, radius, u8::max), radius, u8::max)
}

/// Grayscale erosion with a square element of side `2·radius + 1`.
fn grayscale_erode(gray: &GrayImage, radius: u32) -> GrayImage {
    column_filter(&row_filter(gray, radius, u8::min), radius, u8::min)
}

/// Grayscale close (dilate, then erode): merges broken bright structures
/// such as interrupted page-edge segments.
fn grayscale_close(gray: &GrayImage, radius: u32) -> GrayImage {
    grayscale_erode(&grayscale_dilate(gray, radius), radius)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// A uniform frame has no edges; both recipes must return an all-black
    /// map of the same dimensions without panicking.
    #[test]
    fn uniform_frame_yields_empty_edge_map() {
        let gray = GrayImage::from_pixel(120, 90, Luma([180u8]));
        let opts = RectifyOptions::default();
        let builder = EdgeMapBuilder::new(&opts);

        for edges in [builder.contour_edges(&gray), builder.hough_edges(&gray)] {
            assert_eq!(edges.dimensions(), (120, 90));
            assert!(edges.pixels().all(|p| p.0[0] == 0));
        }
    }

    /// A high-contrast rectangle produces edge pixels near its border.
    #[test]
    fn rectangle_produces_border_edges() {
        let mut gray = GrayImage::from_pixel(200, 160, Luma([10u8]));
        for y in 40..120 {
            for x in 50..150 {
                gray.put_pixel(x, y, Luma([240u8]));
            }
        }
        let opts = RectifyOptions::default();
        let edges = EdgeMapBuilder::new(&opts).contour_edges(&gray);
        let edge_count = edges.pixels().filter(|p| p.0[0] > 0).count();
        assert!(edge_count > 100, "expected border edges, got {edge_count}");
    }

    /// Closing bridges a short gap in a bright line.
    #[test]
    fn close_bridges_small_gap() {
        let mut gray = GrayImage::from_pixel(60, 20, Luma([0u8]));
        for x in 5..28 {
            gray.put_pixel(x, 10, Luma([255u8]));
        }
        for x in 33..55 {
            gray.put_pixel(x, 10, Luma([255u8]));
        }
        let closed = grayscale_close(&gray, 4);
        for x in 28..33 {
            assert_eq!(closed.get_pixel(x, 10).0[0], 255, "gap at x={x} not bridged");
        }
    }

    /// Dilation and erosion are dual: eroding a dilated flat region restores
    /// its interior values.
    #[test]
    fn dilate_erode_roundtrip_on_flat_region() {
        let gray = GrayImage::from_pixel(40, 30, Luma([77u8]));
        let round = grayscale_erode(&grayscale_dilate(&gray, 3), 3);
        assert!(round.pixels().all(|p| p.0[0] == 77));
    }

    /// Kernel-to-sigma conversion follows the OpenCV convention.
    #[test]
    fn sigma_for_common_kernels() {
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel(7) - 1.4).abs() < 1e-6);
    }
}
