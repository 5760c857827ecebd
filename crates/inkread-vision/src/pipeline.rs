// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end preprocessing: source image in, recognition variants out.

use inkread_core::error::Result;
use tracing::{info, instrument};

use crate::image::{ImageProcessor, SourceImage};
use crate::scan::{EnhanceParams, PipelineVariant, ScanEnhancer, VariantParams, generate_variants};

/// Normalize, enhance and derive the variants for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    pub target_long_side: u32,
    pub enhance: EnhanceParams,
    pub variants: VariantParams,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(2100)
    }
}

impl Preprocessor {
    pub fn new(target_long_side: u32) -> Self {
        Self {
            target_long_side,
            enhance: EnhanceParams::default(),
            variants: VariantParams::default(),
        }
    }

    /// Run every stage on an already-decoded page.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn run(&self, source: SourceImage) -> Vec<PipelineVariant> {
        let normalized = ImageProcessor::from_source(source)
            .normalize(self.target_long_side)
            .into_dynamic();
        let frame = ScanEnhancer::from_dynamic(&normalized)
            .enhance(&self.enhance)
            .into_gray();
        drop(normalized);

        let variants = generate_variants(frame, &self.variants);
        info!(count = variants.len(), "Preprocessing complete");
        variants
    }

    /// Decode and run. Fails only when the bytes are not an image.
    pub fn run_bytes(&self, data: &[u8]) -> Result<Vec<PipelineVariant>> {
        Ok(self.run(SourceImage::decode(data)?))
    }
}
