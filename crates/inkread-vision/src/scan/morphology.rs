// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Morphological cleanup with rectangular structuring elements.
//
// The kernel anchor sits at (width / 2, height / 2), so a 2x2 kernel covers
// the pixel and its upper-left neighbours. Pixels outside the frame never
// take part in the min/max.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_close, grayscale_open};
use tracing::{debug, instrument};

/// A `width` x `height` rectangular structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectKernel {
    pub width: u8,
    pub height: u8,
}

impl RectKernel {
    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    pub const fn square(size: u8) -> Self {
        Self::new(size, size)
    }

    /// The kernel as an anchored mask. Zero-sized kernels act as 1x1.
    pub fn mask(&self) -> Mask {
        let (width, height) = (self.width.max(1), self.height.max(1));
        let footprint = GrayImage::from_pixel(width.into(), height.into(), Luma([255u8]));
        Mask::from_image(&footprint, width / 2, height / 2)
    }
}

/// Erosion then dilation: removes white specks smaller than the kernel.
pub fn open(gray: &GrayImage, kernel: RectKernel) -> GrayImage {
    grayscale_open(gray, &kernel.mask())
}

/// Dilation then erosion: fills black specks and gaps smaller than the kernel.
pub fn close(gray: &GrayImage, kernel: RectKernel) -> GrayImage {
    grayscale_close(gray, &kernel.mask())
}

/// One opening followed by one closing.
#[instrument(skip(binary), fields(width = binary.width(), height = binary.height()))]
pub fn open_then_close(binary: &GrayImage, open_kernel: RectKernel, close_kernel: RectKernel) -> GrayImage {
    let opened = open(binary, open_kernel);
    let closed = close(&opened, close_kernel);
    debug!(
        open = ?open_kernel,
        close = ?close_kernel,
        "Morphological cleanup applied"
    );
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::distance_transform::Norm;

    #[test]
    fn opening_removes_isolated_white_speck() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([0u8]));
        img.put_pixel(5, 5, Luma([255u8]));
        let out = open(&img, RectKernel::square(2));
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn closing_fills_single_pixel_hole() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255u8]));
        img.put_pixel(4, 4, Luma([0u8]));
        let out = close(&img, RectKernel::square(3));
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn even_kernel_opening_keeps_block_size() {
        // The 2x2 anchor is not centred, so the block moves one pixel down
        // and right but keeps its 6x6 extent.
        let mut img = GrayImage::from_pixel(12, 12, Luma([0u8]));
        for y in 3..9 {
            for x in 3..9 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let out = open(&img, RectKernel::square(2));
        let white: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(white.len(), 36);
        assert!(white.iter().all(|&(x, y)| (4..10).contains(&x) && (4..10).contains(&y)));
    }

    #[test]
    fn mask_anchor_follows_kernel_centre() {
        let point = GrayImage::from_fn(5, 5, |x, y| Luma([if (x, y) == (2, 2) { 255 } else { 0 }]));
        // Dilating a single point with the 2x2 mask marks it and the pixels
        // below and to the right of it.
        let grown = imageproc::morphology::grayscale_dilate(&point, &RectKernel::square(2).mask());
        let lit: Vec<(u32, u32)> = grown
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit, vec![(2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn opening_ignores_outside_pixels() {
        let img = GrayImage::from_pixel(4, 4, Luma([200u8]));
        let out = open(&img, RectKernel::square(3));
        assert!(out.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn square_three_matches_chessboard_close() {
        let img = GrayImage::from_fn(24, 16, |x, y| {
            if (x * 3 + y * 5) % 7 < 3 { Luma([255u8]) } else { Luma([0u8]) }
        });
        let ours = close(&img, RectKernel::square(3));
        let chessboard = imageproc::morphology::close(&img, Norm::LInf, 1);
        assert_eq!(ours, chessboard);
    }

    #[test]
    fn open_then_close_preserves_dimensions() {
        let img = GrayImage::from_pixel(7, 5, Luma([255u8]));
        let out = open_then_close(&img, RectKernel::square(2), RectKernel::square(3));
        assert_eq!(out.dimensions(), (7, 5));
    }
}
