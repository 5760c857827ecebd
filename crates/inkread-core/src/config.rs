// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognizer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InkreadError, Result};

/// How a fresh attempt's score is compared against the running best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Compare the new score against the stored best's *confidence*.
    ///
    /// This is asymmetric: the stored side carries no length bonus, so a
    /// later attempt can win on bonus alone even with a lower confidence.
    #[default]
    StoredConfidence,
    /// Compare the new score against the stored best's score.
    StoredScore,
}

/// Persistent recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Images whose longer side is below this are upscaled to it (never downscaled).
    pub target_long_side: u32,
    /// Language sets in priority order, combined-script set first.
    pub languages: Vec<String>,
    /// Segmentation modes in search order.
    pub segmentation_modes: Vec<String>,
    /// Engine mode passed as `--oem`.
    pub engine_mode: u8,
    /// DPI hint passed as `user_defined_dpi`.
    pub dpi_hint: u32,
    /// Upper bound on a single engine invocation.
    pub attempt_timeout_secs: u64,
    /// Attempts in flight at once within one language set.
    pub concurrency: usize,
    /// Running-best comparison rule.
    pub comparison: ComparisonPolicy,
    /// Path or name of the tesseract executable.
    pub tesseract_binary: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            target_long_side: 2100,
            languages: vec!["eng+ara".into(), "eng".into()],
            segmentation_modes: vec!["6".into(), "4".into(), "11".into(), "3".into()],
            engine_mode: 3,
            dpi_hint: 300,
            attempt_timeout_secs: 60,
            concurrency: 4,
            comparison: ComparisonPolicy::StoredConfidence,
            tesseract_binary: "tesseract".into(),
        }
    }
}

impl RecognizerConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_long_side == 0 {
            return Err(InkreadError::Config("target_long_side must be positive".into()));
        }
        if self.languages.iter().all(|lang| lang.trim().is_empty()) {
            return Err(InkreadError::Config("at least one language set is required".into()));
        }
        if self.segmentation_modes.iter().all(|mode| mode.trim().is_empty()) {
            return Err(InkreadError::Config(
                "at least one segmentation mode is required".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(InkreadError::Config("concurrency must be at least 1".into()));
        }
        if self.attempt_timeout_secs == 0 {
            return Err(InkreadError::Config("attempt_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_search_space() {
        let config = RecognizerConfig::default();
        assert_eq!(config.target_long_side, 2100);
        assert_eq!(config.languages.len(), 2);
        assert_eq!(config.segmentation_modes, vec!["6", "4", "11", "3"]);
        assert_eq!(config.comparison, ComparisonPolicy::StoredConfidence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{ "languages": ["deu"], "comparison": "stored_score" }"#)
                .unwrap();
        assert_eq!(config.languages, vec!["deu"]);
        assert_eq!(config.comparison, ComparisonPolicy::StoredScore);
        assert_eq!(config.target_long_side, 2100);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let config = RecognizerConfig {
            concurrency: 0,
            ..RecognizerConfig::default()
        };
        assert!(matches!(config.validate(), Err(InkreadError::Config(_))));
    }

    #[test]
    fn rejects_empty_language_list() {
        let config = RecognizerConfig {
            languages: vec![" ".into()],
            ..RecognizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkread.json");
        let config = RecognizerConfig {
            concurrency: 2,
            ..RecognizerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RecognizerConfig::load(&path).unwrap(), config);
    }
}
