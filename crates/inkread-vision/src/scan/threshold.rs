// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global (Otsu) and adaptive (Gaussian-weighted) binarization.

use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold};
use tracing::{debug, instrument};

use super::filters::gaussian_blur_replicate;

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that maximises the between-class variance of
/// the `[0, t]` and `(t, 255]` pixel groups.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let mut sum_total: f64 = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Global Otsu binarization: dark text on white stays dark on white.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_threshold(gray);
    debug!(threshold = level, "Otsu threshold computed");
    threshold(gray, level, ThresholdType::Binary)
}

/// Gaussian sigma for a kernel of `ksize` taps when none is given.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Adaptive Gaussian-weighted local thresholding.
///
/// For each pixel the threshold is the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood minus `c`. Pixels strictly above
/// the local threshold become white; others become black.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn binarize_adaptive_gaussian(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    // Even block sizes have no centre pixel.
    let block_size = block_size.max(3) | 1;
    let local_mean = gaussian_blur_replicate(gray, block_size, sigma_for_kernel(block_size));

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let val = gray.get_pixel(x, y).0[0] as f32;
        let mean = local_mean.get_pixel(x, y).0[0] as f32;
        Luma([if val > mean - c { 255 } else { 0 }])
    })
}
