// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inkread-vision: image preprocessing for Inkread.
//
// Decodes and normalizes the page (orientation, colour model, upscaling),
// enhances it (deskew, CLAHE, bilateral smoothing, unsharp mask) and derives
// the three recognition variants (enhanced grayscale, Otsu binary, adaptive
// binary).

pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary types so callers can use `inkread_vision::Preprocessor` etc.
pub use self::image::{ImageProcessor, SourceImage};
pub use pipeline::Preprocessor;
pub use scan::{EnhanceParams, PipelineVariant, ScanEnhancer, VariantParams, generate_variants};
