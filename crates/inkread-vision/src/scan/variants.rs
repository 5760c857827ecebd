// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition variants derived from the enhanced grayscale frame.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{GrayImage, ImageFormat};
use inkread_core::VariantKind;
use inkread_core::error::{InkreadError, Result};
use tracing::{debug, info, instrument};

use super::morphology::{RectKernel, open_then_close};
use super::threshold::{binarize_adaptive_gaussian, binarize_otsu};

/// Parameters of the two binary variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantParams {
    /// Neighbourhood size of the adaptive threshold (odd).
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local mean.
    pub adaptive_offset: f32,
    pub open_kernel: RectKernel,
    pub close_kernel: RectKernel,
}

impl Default for VariantParams {
    fn default() -> Self {
        Self {
            adaptive_block_size: 33,
            adaptive_offset: 11.0,
            open_kernel: RectKernel::square(2),
            close_kernel: RectKernel::square(3),
        }
    }
}

/// One rendering of the page offered to the recognition engine.
///
/// The image is reference counted so concurrent attempts can share it
/// without copying.
#[derive(Debug, Clone)]
pub struct PipelineVariant {
    pub kind: VariantKind,
    pub image: Arc<GrayImage>,
}

impl PipelineVariant {
    pub fn new(kind: VariantKind, image: GrayImage) -> Self {
        Self {
            kind,
            image: Arc::new(image),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Encode the variant as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| {
                InkreadError::ImageEncode(format!("{} as PNG: {}", self.name(), err))
            })?;
        Ok(buffer)
    }

    /// Write `<dir>/<name>.png` and return the written path.
    pub fn save_png(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(format!("{}.png", self.name()));
        std::fs::write(&path, self.to_png_bytes()?)?;
        debug!(path = %path.display(), "Variant written");
        Ok(path)
    }
}

/// Produce the three variants in search-priority order: the frame itself,
/// Otsu binary, adaptive binary. Both binaries get one opening and one
/// closing.
#[instrument(skip(frame), fields(width = frame.width(), height = frame.height()))]
pub fn generate_variants(frame: GrayImage, params: &VariantParams) -> Vec<PipelineVariant> {
    let otsu = open_then_close(&binarize_otsu(&frame), params.open_kernel, params.close_kernel);
    let adaptive = open_then_close(
        &binarize_adaptive_gaussian(&frame, params.adaptive_block_size, params.adaptive_offset),
        params.open_kernel,
        params.close_kernel,
    );
    info!("Generated recognition variants");

    vec![
        PipelineVariant::new(VariantKind::GrayClaheSharp, frame),
        PipelineVariant::new(VariantKind::BinaryOtsuMorph, otsu),
        PipelineVariant::new(VariantKind::BinaryAdaptMorph, adaptive),
    ]
}
