// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: enhancement of the normalized page, then binarization
// and morphology for the recognition variants.

pub mod deskew;
pub mod enhance;
pub mod filters;
pub mod morphology;
pub mod threshold;
pub mod variants;

pub use enhance::{EnhanceParams, ScanEnhancer};
pub use morphology::RectKernel;
pub use variants::{PipelineVariant, VariantParams, generate_variants};
