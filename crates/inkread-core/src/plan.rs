// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search plan: the immutable description of what a request will try and in
// which order: language sets (outer), variants (middle), configs (inner).

use std::time::Duration;

use crate::config::{ComparisonPolicy, RecognizerConfig};
use crate::error::Result;
use crate::types::{LanguageSet, RecognitionConfig, VariantKind, Whitelist};

/// One (language, variant, config) cell of the search space, with the
/// configuration string already rendered for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub language: LanguageSet,
    pub variant: VariantKind,
    pub config_id: String,
    pub config_string: String,
}

/// Built once from a [`RecognizerConfig`] and shared read-only by every
/// request.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    languages: Vec<LanguageSet>,
    configs: Vec<RecognitionConfig>,
    attempt_timeout: Duration,
    concurrency: usize,
    comparison: ComparisonPolicy,
}

impl SearchPlan {
    pub fn from_config(config: &RecognizerConfig) -> Result<Self> {
        config.validate()?;
        let languages = config
            .languages
            .iter()
            .map(|lang| lang.trim())
            .filter(|lang| !lang.is_empty())
            .map(LanguageSet::new)
            .collect();
        let configs = config
            .segmentation_modes
            .iter()
            .map(|mode| mode.trim())
            .filter(|mode| !mode.is_empty())
            .map(|mode| RecognitionConfig::for_mode(mode, config.engine_mode, config.dpi_hint))
            .collect();
        Ok(Self {
            languages,
            configs,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            concurrency: config.concurrency,
            comparison: config.comparison,
        })
    }

    pub fn languages(&self) -> &[LanguageSet] {
        &self.languages
    }

    pub fn configs(&self) -> &[RecognitionConfig] {
        &self.configs
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn comparison(&self) -> ComparisonPolicy {
        self.comparison
    }

    /// Override the per-attempt timeout (mostly useful in tests).
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Number of attempts per language set.
    pub fn attempts_per_language(&self) -> usize {
        VariantKind::ALL.len() * self.configs.len()
    }

    /// Upper bound on attempts for one request.
    pub fn max_attempts(&self) -> usize {
        self.languages.len() * self.attempts_per_language()
    }

    /// Combinations for one language set: variants in generator order, and
    /// for each variant every config in search order.
    pub fn combinations(
        &self,
        language: &LanguageSet,
        whitelist: Option<&Whitelist>,
    ) -> Vec<Combination> {
        VariantKind::ALL
            .iter()
            .flat_map(|variant| {
                self.configs.iter().map(move |config| Combination {
                    language: language.clone(),
                    variant: *variant,
                    config_id: config.id.clone(),
                    config_string: config.render(whitelist),
                })
            })
            .collect()
    }
}
