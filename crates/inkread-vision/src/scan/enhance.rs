// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline: grayscale, skew correction, local contrast,
// edge-preserving smoothing and sharpening. The result is the canonical frame
// every recognition variant is derived from.

use image::{DynamicImage, GrayImage};
use tracing::{debug, info, instrument};

use super::deskew;
use super::filters::{bilateral, clahe, unsharp_mask};

/// Tuning knobs for [`ScanEnhancer::enhance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceParams {
    /// CLAHE clip limit (multiples of the mean bin height).
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per side.
    pub clahe_grid: u32,
    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    pub sharpen_sigma: f32,
    /// Weight of the original image in the unsharp mask.
    pub sharpen_amount: f32,
    /// Weight of the blurred image in the unsharp mask (negative).
    pub sharpen_blur_weight: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_grid: 8,
            bilateral_diameter: 7,
            bilateral_sigma_color: 60.0,
            bilateral_sigma_space: 60.0,
            sharpen_sigma: 1.0,
            sharpen_amount: 1.6,
            sharpen_blur_weight: -0.6,
        }
    }
}

/// Enhances a photographed or scanned page for recognition.
///
/// Each step consumes `self` and returns the transformed enhancer, so steps
/// can be chained or run individually:
///
/// ```ignore
/// let frame = ScanEnhancer::from_dynamic(&image)
///     .deskew()
///     .equalize(3.0, 8)
///     .into_gray();
/// ```
pub struct ScanEnhancer {
    /// The working single-channel image.
    image: GrayImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Start from any decoded image, converting it to grayscale.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: image.to_luma8(),
        }
    }

    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    // -- Steps ----------------------------------------------------------------

    /// Rotate skewed text back to horizontal. Never fails; see
    /// [`deskew::deskew`].
    pub fn deskew(self) -> Self {
        Self {
            image: deskew::deskew(&self.image),
        }
    }

    /// Contrast-limited adaptive histogram equalization.
    pub fn equalize(self, clip_limit: f32, grid: u32) -> Self {
        Self {
            image: clahe(&self.image, clip_limit, grid),
        }
    }

    /// Bilateral smoothing: flattens paper texture while keeping stroke edges.
    pub fn smooth(self, diameter: u32, sigma_color: f32, sigma_space: f32) -> Self {
        Self {
            image: bilateral(&self.image, diameter, sigma_color, sigma_space),
        }
    }

    /// Unsharp mask: `amount * original + blur_weight * blurred`.
    pub fn sharpen(self, sigma: f32, amount: f32, blur_weight: f32) -> Self {
        Self {
            image: unsharp_mask(&self.image, sigma, amount, blur_weight),
        }
    }

    // -- Pipeline -------------------------------------------------------------

    /// Run the full chain in its fixed order:
    ///
    /// 1. Skew correction
    /// 2. CLAHE
    /// 3. Bilateral smoothing
    /// 4. Unsharp mask
    #[instrument(skip_all, fields(width = self.image.width(), height = self.image.height()))]
    pub fn enhance(self, params: &EnhanceParams) -> Self {
        info!("Running scan enhancement pipeline");
        let enhanced = self
            .deskew()
            .equalize(params.clahe_clip_limit, params.clahe_grid)
            .smooth(
                params.bilateral_diameter,
                params.bilateral_sigma_color,
                params.bilateral_sigma_space,
            )
            .sharpen(
                params.sharpen_sigma,
                params.sharpen_amount,
                params.sharpen_blur_weight,
            );
        debug!("Scan enhancement complete");
        enhanced
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb, RgbImage};

    use super::*;
    use crate::scan::deskew::estimate_skew;

    fn page_with_bar() -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 200, Luma([240u8]));
        for y in 88..112 {
            for x in 25..175 {
                img.put_pixel(x, y, Luma([30u8]));
            }
        }
        img
    }

    #[test]
    fn default_params_match_pipeline_constants() {
        let params = EnhanceParams::default();
        assert_eq!(params.clahe_clip_limit, 3.0);
        assert_eq!(params.clahe_grid, 8);
        assert_eq!(params.bilateral_diameter, 7);
        assert_eq!(params.sharpen_amount + params.sharpen_blur_weight, 1.0);
    }

    #[test]
    fn enhance_preserves_dimensions() {
        let rgb = RgbImage::from_pixel(64, 48, Rgb([200, 180, 160]));
        let out = ScanEnhancer::from_dynamic(&DynamicImage::ImageRgb8(rgb))
            .enhance(&EnhanceParams::default())
            .into_gray();
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn enhanced_upright_page_stays_upright() {
        let out = ScanEnhancer::from_gray(page_with_bar())
            .enhance(&EnhanceParams::default())
            .into_gray();
        let angle = estimate_skew(&out).unwrap();
        assert!(angle.abs() < 1.0, "angle {angle}");
    }

    #[test]
    fn second_enhancement_pass_adds_no_rotation() {
        let params = EnhanceParams::default();
        let once = ScanEnhancer::from_gray(page_with_bar())
            .enhance(&params)
            .into_gray();
        let twice = ScanEnhancer::from_gray(once.clone())
            .enhance(&params)
            .into_gray();

        assert_eq!(twice.dimensions(), once.dimensions());
        for (pass, frame) in [("once", &once), ("twice", &twice)] {
            let angle = estimate_skew(frame).unwrap();
            assert!(angle.abs() < 1.0, "{pass}: angle {angle}");
        }
        // The bar is still where it started: centre dark, margins light.
        assert!(twice.get_pixel(100, 100).0[0] < 100);
        assert!(twice.get_pixel(100, 20).0[0] > 150);
        assert!(twice.get_pixel(100, 180).0[0] > 150);
    }

    #[test]
    fn enhancement_keeps_ink_dark_and_paper_light() {
        let out = ScanEnhancer::from_gray(page_with_bar())
            .enhance(&EnhanceParams::default())
            .into_gray();
        assert!(out.get_pixel(100, 100).0[0] < 100);
        assert!(out.get_pixel(100, 20).0[0] > 150);
    }

    #[test]
    fn steps_can_run_individually() {
        let out = ScanEnhancer::from_gray(page_with_bar())
            .equalize(2.0, 4)
            .into_gray();
        assert_eq!(out.dimensions(), (200, 200));
    }
}
