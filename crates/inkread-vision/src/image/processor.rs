// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: orientation fix-up, colour model conversion and upscaling
// of the decoded page before enhancement.

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::DynamicImage;
use tracing::{debug, info, instrument};

use super::source::SourceImage;

/// Geometry normalization operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_source(source)
///     .to_rgb()
///     .upscale_to_long_side(2100)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Take a decoded source and apply its orientation metadata.
    pub fn from_source(source: SourceImage) -> Self {
        let (image, orientation) = source.into_parts();
        Self { image }.apply_orientation(orientation)
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate/flip so the page appears the way the camera intended.
    pub fn apply_orientation(mut self, orientation: Orientation) -> Self {
        if orientation != Orientation::NoTransforms {
            debug!(?orientation, "Applying orientation metadata");
            self.image.apply_orientation(orientation);
        }
        self
    }

    /// Convert to 8-bit RGB, dropping any alpha channel.
    pub fn to_rgb(self) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
        }
    }

    /// Upscale with linear interpolation so the longer side becomes exactly
    /// `target`, preserving aspect ratio. Images already at or above the
    /// target are left alone.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn upscale_to_long_side(self, target: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        let long_side = w.max(h);
        if long_side == 0 || long_side >= target {
            return self;
        }

        let (new_w, new_h) = scaled_dimensions(w, h, target);
        info!(from_w = w, from_h = h, new_w, new_h, "Upscaling image");
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Triangle),
        }
    }

    /// The full normalization: orientation was applied at construction, then
    /// RGB conversion and upscaling.
    pub fn normalize(self, target_long_side: u32) -> Self {
        self.to_rgb().upscale_to_long_side(target_long_side)
    }
}

/// Dimensions with the longer side set to `target` and the shorter side
/// scaled by the same factor (rounded, at least one pixel).
fn scaled_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| {
        ((short as f64 * target as f64 / long as f64).round() as u32).max(1)
    };
    if width >= height {
        (target, scale(height, width))
    } else {
        (scale(width, height), target)
    }
}
