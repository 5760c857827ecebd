// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Inkread recognition requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Maximum bonus a long text can add to an attempt's score.
pub const MAX_LENGTH_BONUS: f64 = 5.0;

/// Characters of recognised text worth one point of score bonus.
pub const CHARS_PER_BONUS_POINT: f64 = 300.0;

/// Unique identifier for a recognition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three preprocessed renderings offered to the engine, in search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    /// Enhanced grayscale frame (CLAHE, bilateral, unsharp mask).
    GrayClaheSharp,
    /// Global Otsu binarization followed by open/close morphology.
    BinaryOtsuMorph,
    /// Adaptive Gaussian binarization followed by open/close morphology.
    BinaryAdaptMorph,
}

impl VariantKind {
    /// All variants in generator order. This order is the search priority
    /// within one language set.
    pub const ALL: [VariantKind; 3] = [
        VariantKind::GrayClaheSharp,
        VariantKind::BinaryOtsuMorph,
        VariantKind::BinaryAdaptMorph,
    ];

    /// Stable pipeline name reported back to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrayClaheSharp => "gray_clahe_sharp",
            Self::BinaryOtsuMorph => "binary_otsu_morph",
            Self::BinaryAdaptMorph => "binary_adapt_morph",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered combination of script languages attempted together, in the
/// engine's `a+b` notation (e.g. `eng+ara`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageSet(pub String);

impl LanguageSet {
    pub fn new(languages: impl Into<String>) -> Self {
        Self(languages.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual language codes in this set.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.split('+').map(str::trim).filter(|code| !code.is_empty())
    }
}

impl std::fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed engine parameter string: engine mode, layout assumption
/// (segmentation mode) and DPI hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Segmentation mode identifier reported back to callers ("6", "4", ...).
    pub id: String,
    /// Full engine parameter string, e.g. `--oem 3 --psm 6 -c user_defined_dpi=300`.
    pub engine_string: String,
}

impl RecognitionConfig {
    /// Build the configuration for one segmentation mode.
    pub fn for_mode(mode: &str, engine_mode: u8, dpi_hint: u32) -> Self {
        Self {
            id: mode.to_string(),
            engine_string: format!(
                "--oem {engine_mode} --psm {mode} -c user_defined_dpi={dpi_hint}"
            ),
        }
    }

    /// The engine string for one request, with the whitelist directive
    /// appended when one was supplied.
    pub fn render(&self, whitelist: Option<&Whitelist>) -> String {
        match whitelist {
            Some(whitelist) => format!("{} {}", self.engine_string, whitelist.directive()),
            None => self.engine_string.clone(),
        }
    }
}

/// Caller-supplied character restriction, valid for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist(String);

impl Whitelist {
    /// Returns `None` for a missing, empty, or all-whitespace whitelist.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.filter(|chars| !chars.trim().is_empty())
            .map(|chars| Self(chars.to_string()))
    }

    /// Engine character-restriction directive for this whitelist.
    pub fn directive(&self) -> String {
        format!("-c tessedit_char_whitelist={}", self.0)
    }
}

/// Raw engine output for one invocation: text plus a per-token confidence
/// list. Negative confidences mean "no confidence reported for this token".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub confidences: Vec<f32>,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidences: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            confidences,
        }
    }
}

/// One evaluated (language, variant, config) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub language: LanguageSet,
    pub variant: VariantKind,
    pub config_id: String,
    pub text: String,
    /// Rounded average confidence in [0, 100].
    pub confidence: f64,
}

impl Attempt {
    /// Build an attempt from engine output, averaging its valid confidences.
    pub fn from_recognition(
        language: LanguageSet,
        variant: VariantKind,
        config_id: impl Into<String>,
        recognition: Recognition,
    ) -> Self {
        let confidence = average_confidence(&recognition.confidences);
        Self {
            language,
            variant,
            config_id: config_id.into(),
            text: recognition.text,
            confidence,
        }
    }

    /// Ranking value used during search only.
    pub fn score(&self) -> f64 {
        score(self.confidence, &self.text)
    }
}

/// Outcome of one combination: a scored attempt or a skipped engine failure.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Recognized(Attempt),
    Skipped {
        language: LanguageSet,
        variant: VariantKind,
        config_id: String,
        error: EngineError,
    },
}

/// The single artifact returned for a recognition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestResult {
    pub text: String,
    /// Average confidence in [0, 100], rounded to one decimal place.
    pub confidence: f64,
    /// Name of the winning variant, empty if nothing was recognised.
    pub pipeline: String,
    /// Segmentation mode of the winning config, empty if nothing was recognised.
    pub config_id: String,
}

impl Default for BestResult {
    fn default() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            pipeline: String::new(),
            config_id: String::new(),
        }
    }
}

impl BestResult {
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            text: attempt.text.clone(),
            confidence: attempt.confidence,
            pipeline: attempt.variant.as_str().to_string(),
            config_id: attempt.config_id.clone(),
        }
    }

    /// True when the text is non-empty after trimming whitespace.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Diagnostics for one search, returned alongside the best result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub request_id: RequestId,
    pub best: BestResult,
    /// Engine invocations started.
    pub attempts: usize,
    /// Invocations that failed and were skipped.
    pub skipped: usize,
    /// Language sets actually searched, in order.
    pub languages_tried: Vec<String>,
    pub elapsed_ms: u64,
}

/// Average of the finite, non-negative confidences, clamped to 0..=100 and
/// rounded to one decimal place. Returns 0.0 when no valid confidence exists.
pub fn average_confidence(confidences: &[f32]) -> f64 {
    let valid: Vec<f64> = confidences
        .iter()
        .filter(|conf| conf.is_finite() && **conf >= 0.0)
        .map(|conf| f64::from(*conf))
        .collect();
    if valid.is_empty() {
        return 0.0;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    round_one_decimal(mean.clamp(0.0, 100.0))
}

/// `confidence + min(chars / 300, 5)`.
pub fn score(confidence: f64, text: &str) -> f64 {
    let bonus = (text.chars().count() as f64 / CHARS_PER_BONUS_POINT).min(MAX_LENGTH_BONUS);
    confidence + bonus
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
