// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-processing of the warped page: unsharp masking to counteract warp
// softening, then local adaptive thresholding for a clean black-and-white
// rendering. Local rather than global thresholding because photographed
// pages commonly have uneven illumination.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument};

use blattwerk_core::RectifyOptions;

/// Sharpens and binarizes a rectified page image.
#[derive(Debug, Default)]
pub struct PostProcessor;

impl PostProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Unsharp mask: blur the image, then recombine original and blur with
    /// weights that amplify the original and subtract the blur.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn sharpen(&self, gray: &GrayImage, opts: &RectifyOptions) -> GrayImage {
        let (w_orig, w_blur) = opts.sharpen_weights;
        let blurred = gaussian_blur_f32(gray, opts.sharpen_sigma);

        let mut output = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let orig = gray.get_pixel(x, y).0[0] as f32;
            let blur = blurred.get_pixel(x, y).0[0] as f32;
            let combined = (w_orig * orig + w_blur * blur).clamp(0.0, 255.0);
            *pixel = Luma([combined as u8]);
        }
        debug!(w_orig, w_blur, sigma = opts.sharpen_sigma, "Unsharp mask applied");
        output
    }

    /// Local adaptive threshold: each pixel is compared against the mean of
    /// its block-sized neighbourhood minus a constant offset.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn threshold(&self, gray: &GrayImage, opts: &RectifyOptions) -> GrayImage {
        let (width, height) = gray.dimensions();
        let radius = opts.threshold_block_size / 2;

        let table = SummedArea::build(gray);
        let mut output = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let local_mean = table.block_mean(x, y, radius);
                let threshold =
                    (local_mean as i32 - opts.threshold_offset).clamp(0, 255) as u8;
                let value = gray.get_pixel(x, y).0[0];
                let binary = if value < threshold { 0u8 } else { 255u8 };
                output.put_pixel(x, y, Luma([binary]));
            }
        }
        debug!(
            block = opts.threshold_block_size,
            offset = opts.threshold_offset,
            "Adaptive threshold applied"
        );
        output
    }

    /// Full cleanup pass: sharpen, then binarize.
    #[instrument(skip_all)]
    pub fn clean(&self, gray: &GrayImage, opts: &RectifyOptions) -> GrayImage {
        info!("Running post-processing (sharpen + adaptive threshold)");
        let sharpened = self.sharpen(gray, opts);
        self.threshold(&sharpened, opts)
    }
}

// -- Summed-area table --------------------------------------------------------

/// Summed-area table over a grayscale image. One extra zeroed row and column
/// at the top/left let block sums read four cells with no boundary branches.
struct SummedArea {
    cols: usize,
    cells: Vec<u64>,
    width: u32,
    height: u32,
}

impl SummedArea {
    fn build(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let cols = width as usize + 1;
        let mut cells = vec![0u64; cols * (height as usize + 1)];

        for (y, row) in gray.rows().enumerate() {
            let mut running = 0u64;
            for (x, px) in row.enumerate() {
                running += px.0[0] as u64;
                cells[(y + 1) * cols + (x + 1)] = running + cells[y * cols + (x + 1)];
            }
        }

        Self { cols, cells, width, height }
    }

    fn at(&self, x: usize, y: usize) -> u64 {
        self.cells[y * self.cols + x]
    }

    /// Mean intensity of the square block of the given radius centred on
    /// (cx, cy), clamped to the image rectangle.
    fn block_mean(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let left = cx.saturating_sub(radius) as usize;
        let top = cy.saturating_sub(radius) as usize;
        let right = (cx + radius + 1).min(self.width) as usize;
        let bottom = (cy + radius + 1).min(self.height) as usize;

        let count = ((right - left) * (bottom - top)) as f64;
        let sum =
            self.at(right, bottom) + self.at(left, top) - self.at(left, bottom) - self.at(right, top);
        sum as f64 / count
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean absolute difference from the local (radius-2) mean — a crude
    /// local-contrast metric.
    fn local_contrast(gray: &GrayImage) -> f64 {
        let table = SummedArea::build(gray);
        let (w, h) = gray.dimensions();
        let mut total = 0.0f64;
        for y in 0..h {
            for x in 0..w {
                let mean = table.block_mean(x, y, 2);
                total += (gray.get_pixel(x, y).0[0] as f64 - mean).abs();
            }
        }
        total / (w as f64 * h as f64)
    }

    /// Text-like image: dark glyph blocks on a soft paper background.
    fn soft_text_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(160, 120, Luma([200u8]));
        for row in 0..6 {
            let y0 = 10 + row * 18;
            for y in y0..y0 + 6 {
                for x in 12..148 {
                    // Soft edges: alternate glyph and gap columns.
                    let value = if (x / 8) % 2 == 0 { 90 } else { 160 };
                    img.put_pixel(x, y, Luma([value as u8]));
                }
            }
        }
        gaussian_blur_f32(&img, 1.5)
    }

    /// Sharpening must increase mean local contrast on a soft image.
    #[test]
    fn sharpen_increases_local_contrast() {
        let img = soft_text_image();
        let opts = RectifyOptions::default();
        let sharpened = PostProcessor::new().sharpen(&img, &opts);
        assert!(
            local_contrast(&sharpened) > local_contrast(&img),
            "sharpening should raise local contrast"
        );
    }

    /// Thresholding yields a strictly binary image.
    #[test]
    fn threshold_output_is_binary() {
        let img = soft_text_image();
        let opts = RectifyOptions::default();
        let binary = PostProcessor::new().clean(&img, &opts);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    /// Uneven illumination: a left-to-right brightness ramp with uniform
    /// text must still binarize the text on both the dark and bright side.
    #[test]
    fn threshold_handles_uneven_illumination() {
        let (w, h) = (200u32, 80u32);
        let mut img = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                // Background ramps 120 -> 240; "text" dots 60 below background.
                let bg = 120 + x * 120 / w;
                let is_text = x % 10 < 3 && (20..60).contains(&y);
                let value = if is_text { bg.saturating_sub(60) } else { bg };
                img.put_pixel(x, y, Luma([value.min(255) as u8]));
            }
        }

        let opts = RectifyOptions {
            threshold_offset: 10,
            ..Default::default()
        };
        let binary = PostProcessor::new().threshold(&img, &opts);

        // Text pixels on both halves must come out black.
        assert_eq!(binary.get_pixel(11, 40).0[0], 0, "dark-side text");
        assert_eq!(binary.get_pixel(181, 40).0[0], 0, "bright-side text");
        // Background well away from text must come out white.
        assert_eq!(binary.get_pixel(100, 70).0[0], 255, "background");
    }

    /// The summed-area block mean matches a brute-force mean over the same
    /// block, including near the image border where the block is clamped.
    #[test]
    fn block_mean_matches_brute_force() {
        let mut img = GrayImage::new(9, 7);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Luma([(i * 7 % 256) as u8]);
        }
        let table = SummedArea::build(&img);

        let brute_mean = |cx: i64, cy: i64, radius: i64| -> f64 {
            let mut sum = 0.0;
            let mut count = 0.0;
            for y in (cy - radius).max(0)..=(cy + radius).min(6) {
                for x in (cx - radius).max(0)..=(cx + radius).min(8) {
                    sum += img.get_pixel(x as u32, y as u32).0[0] as f64;
                    count += 1.0;
                }
            }
            sum / count
        };

        for &(cx, cy) in &[(3u32, 4u32), (0, 0), (8, 6), (1, 5)] {
            let fast = table.block_mean(cx, cy, 2);
            let brute = brute_mean(cx as i64, cy as i64, 2);
            assert!((brute - fast).abs() < 1e-9, "mismatch at ({cx}, {cy})");
        }
    }
}
