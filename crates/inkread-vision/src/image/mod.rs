// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding and geometry normalization.

pub mod processor;
pub mod source;

pub use processor::ImageProcessor;
pub use source::SourceImage;
