// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding of caller-supplied bytes into an immutable source raster.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use inkread_core::error::{InkreadError, Result};
use tracing::{debug, instrument, warn};

/// A decoded upload, together with the orientation its metadata asks for.
///
/// The raster is never modified; normalization produces a new image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    orientation: Orientation,
}

impl SourceImage {
    /// Decode raw bytes (PNG, JPEG, TIFF, ...). The format is sniffed from the
    /// content. Unreadable orientation metadata is treated as absent.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| InkreadError::InvalidImage(format!("failed to read image: {}", err)))?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|err| InkreadError::InvalidImage(format!("unsupported image: {}", err)))?;
        let orientation = decoder.orientation().unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring unreadable orientation metadata");
            Orientation::NoTransforms
        });
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|err| InkreadError::InvalidImage(format!("failed to decode image: {}", err)))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(InkreadError::InvalidImage("image has no pixels".into()));
        }
        debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            ?orientation,
            "Image decoded"
        );
        Ok(Self { image, orientation })
    }

    /// Wrap an already-decoded image with no orientation metadata.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: Orientation::NoTransforms,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_parts(self) -> (DynamicImage, Orientation) {
        (self.image, self.orientation)
    }
}
