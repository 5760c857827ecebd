// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast and noise filters for single-channel frames: contrast-limited
// adaptive histogram equalization, bilateral smoothing, unsharp masking, and
// a fixed-kernel Gaussian blur with replicated borders.

use image::{GrayImage, Luma};
use imageproc::filter::{bilateral_filter, gaussian_blur_f32};
use tracing::{debug, instrument};

// -- Gaussian -----------------------------------------------------------------

/// Normalised 1-D Gaussian kernel with `ksize` taps.
fn gaussian_kernel(ksize: u32, sigma: f32) -> Vec<f32> {
    let radius = (ksize / 2) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Separable Gaussian blur with an explicit `ksize` window and replicated
/// borders.
pub fn gaussian_blur_replicate(gray: &GrayImage, ksize: u32, sigma: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let kernel = gaussian_kernel(ksize, sigma);
    let radius = (kernel.len() / 2) as i64;
    let src = gray.as_raw();
    let (wi, hi) = (w as i64, h as i64);

    let mut horizontal = vec![0f32; src.len()];
    for y in 0..hi {
        let row = (y * wi) as usize;
        for x in 0..wi {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x + k as i64 - radius).clamp(0, wi - 1) as usize;
                acc += src[row + sx] as f32 * weight;
            }
            horizontal[row + x as usize] = acc;
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0.0f32;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = (y as i64 + k as i64 - radius).clamp(0, hi - 1) as usize;
            acc += horizontal[sy * w as usize + x as usize] * weight;
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

// -- CLAHE --------------------------------------------------------------------

/// Contrast-limited adaptive histogram equalization.
///
/// The frame is split into a `grid` x `grid` lattice of tiles. Each tile's
/// histogram is clipped at `clip_limit * tile_area / 256` counts, the excess
/// is spread evenly across all bins, and the resulting equalization maps
/// are bilinearly interpolated between tile centres.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 || grid == 0 {
        return gray.clone();
    }

    let tile_w = w.div_ceil(grid).max(1);
    let tile_h = h.div_ceil(grid).max(1);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts.push(tile_lut(gray, x0, y0, x1, y1, clip_limit));
        }
    }
    debug!(tiles_x, tiles_y, tile_w, tile_h, "CLAHE tile maps built");

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(w, h, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as usize;

        let fy = y as f32 * inv_th - 0.5;
        let ty1 = fy.floor();
        let ya = fy - ty1;
        let ty2 = ((ty1 as i64 + 1).min(tiles_y as i64 - 1)).max(0) as u32;
        let ty1 = (ty1 as i64).max(0) as u32;

        let fx = x as f32 * inv_tw - 0.5;
        let tx1 = fx.floor();
        let xa = fx - tx1;
        let tx2 = ((tx1 as i64 + 1).min(tiles_x as i64 - 1)).max(0) as u32;
        let tx1 = (tx1 as i64).max(0) as u32;

        let top = lut_at(tx1, ty1)[value] as f32 * (1.0 - xa) + lut_at(tx2, ty1)[value] as f32 * xa;
        let bottom =
            lut_at(tx1, ty2)[value] as f32 * (1.0 - xa) + lut_at(tx2, ty2)[value] as f32 * xa;
        let mapped = top * (1.0 - ya) + bottom * ya;
        Luma([mapped.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clipped-histogram equalization map for one tile.
fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let area = (x1 - x0) * (y1 - y0);

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for count in &mut hist {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }

        let batch = excess / 256;
        let residual = (excess - batch * 256) as usize;
        for count in &mut hist {
            *count += batch;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for count in hist.iter_mut().step_by(step).take(residual) {
                *count += 1;
            }
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (value, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[value] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Bilateral ----------------------------------------------------------------

/// Edge-preserving bilateral filter over a `diameter` x `diameter` window.
///
/// Each neighbour is weighted by its spatial distance (`sigma_space`) and
/// by its intensity difference from the centre (`sigma_color`), so flat
/// regions are smoothed while strong edges survive. Borders are replicated.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn bilateral(gray: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    bilateral_filter(gray, diameter.max(1), sigma_color, sigma_space)
}

// -- Sharpening ---------------------------------------------------------------

/// Unsharp mask: `original * amount + blurred * blur_weight`, clipped to the
/// valid intensity range.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn unsharp_mask(gray: &GrayImage, sigma: f32, amount: f32, blur_weight: f32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    let blurred = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let original = gray.get_pixel(x, y).0[0] as f32;
        let soft = blurred.get_pixel(x, y).0[0] as f32;
        let value = original * amount + soft * blur_weight;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_edge(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Luma([30u8]) } else { Luma([220u8]) }
        })
    }

    #[test]
    fn gaussian_kernel_is_normalised() {
        let kernel = gaussian_kernel(33, 5.3);
        assert_eq!(kernel.len(), 33);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(kernel[16] > kernel[0]);
    }

    #[test]
    fn gaussian_blur_keeps_flat_image() {
        let img = GrayImage::from_pixel(20, 12, Luma([77u8]));
        let out = gaussian_blur_replicate(&img, 33, 5.3);
        assert!(out.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn clahe_preserves_dimensions() {
        let img = step_edge(37, 23);
        let out = clahe(&img, 3.0, 8);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn clahe_stretches_low_contrast_texture() {
        // Every tile holds a texture squeezed into [112, 143].
        let img = GrayImage::from_fn(128, 128, |x, y| Luma([112 + ((x * 7 + y * 13) % 32) as u8]));
        let out = clahe(&img, 3.0, 8);
        let (min, max) = out.pixels().fold((255u8, 0u8), |(lo, hi), p| {
            (lo.min(p.0[0]), hi.max(p.0[0]))
        });
        assert!(max - min > 60, "range {min}..{max} should widen");
    }

    #[test]
    fn clahe_handles_images_smaller_than_grid() {
        let img = GrayImage::from_pixel(3, 2, Luma([50u8]));
        let out = clahe(&img, 3.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn bilateral_keeps_flat_image() {
        let img = GrayImage::from_pixel(16, 16, Luma([140u8]));
        let out = bilateral(&img, 7, 60.0, 60.0);
        assert!(out.pixels().all(|p| p.0[0] == 140));
    }

    #[test]
    fn bilateral_preserves_hard_edges() {
        let img = step_edge(40, 10);
        let out = bilateral(&img, 7, 60.0, 60.0);
        // A 190-level jump is far outside sigma_color, so the sides barely mix.
        assert!(out.get_pixel(19, 5).0[0] < 40);
        assert!(out.get_pixel(20, 5).0[0] > 210);
    }

    #[test]
    fn bilateral_smooths_small_noise() {
        let mut img = GrayImage::from_pixel(15, 15, Luma([128u8]));
        img.put_pixel(7, 7, Luma([148u8]));
        let out = bilateral(&img, 7, 60.0, 60.0);
        assert!(out.get_pixel(7, 7).0[0] < 140);
    }

    #[test]
    fn unsharp_keeps_flat_image() {
        let img = GrayImage::from_pixel(10, 10, Luma([90u8]));
        let out = unsharp_mask(&img, 1.0, 1.6, -0.6);
        assert!(out.pixels().all(|p| p.0[0].abs_diff(90) <= 1));
    }

    #[test]
    fn unsharp_increases_edge_contrast() {
        let img = step_edge(20, 6);
        let out = unsharp_mask(&img, 1.0, 1.6, -0.6);
        assert!(out.get_pixel(9, 3).0[0] < 30);
        assert!(out.get_pixel(10, 3).0[0] > 220);
    }
}
