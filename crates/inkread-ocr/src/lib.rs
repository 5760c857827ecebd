// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inkread-ocr: recognition for Inkread.
//
// Provides the recognition engine capability (with a Tesseract command-line
// implementation), the multi-configuration search that races the image
// variants against every configuration, and the `Recognizer` entry point.

pub mod engine;
pub mod recognizer;
pub mod search;
pub mod tesseract;

pub use engine::RecognitionEngine;
pub use recognizer::Recognizer;
pub use search::{BestSoFar, SearchEngine, SearchSummary};
pub use tesseract::{EngineInfo, TesseractEngine};
