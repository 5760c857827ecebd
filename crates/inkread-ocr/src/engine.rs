// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The recognition capability the search drives.

use async_trait::async_trait;
use image::GrayImage;
use inkread_core::{EngineError, Recognition};

/// Converts (image, language set, configuration string) into text plus
/// per-token confidences.
///
/// Implementations must be safe to call concurrently: the search runs
/// several attempts of one language set at the same time. A failure only
/// skips the attempt it belongs to.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// `languages` uses the engine's `a+b` notation; `config` is a
    /// whitespace-separated engine parameter string.
    async fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &str,
    ) -> Result<Recognition, EngineError>;
}
