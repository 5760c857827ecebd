// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-configuration search and scoring.
//
// Language sets are searched one after another. Within a language set every
// (variant, config) combination is tried, up to `concurrency` at a time, and
// the outcomes are folded in combination order into a best-so-far value. The
// search stops after the first language set that leaves the best with
// non-blank text.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use inkread_core::{
    Attempt, AttemptOutcome, BestResult, Combination, ComparisonPolicy, EngineError, RequestId,
    SearchPlan, Whitelist,
};
use inkread_vision::PipelineVariant;
use tracing::{debug, info, instrument, warn};

use crate::engine::RecognitionEngine;

// ---------------------------------------------------------------------------
// Best-so-far accumulator
// ---------------------------------------------------------------------------

/// Running best candidate of one request.
#[derive(Debug, Clone)]
pub struct BestSoFar {
    best: BestResult,
    best_score: f64,
    policy: ComparisonPolicy,
}

impl BestSoFar {
    pub fn new(policy: ComparisonPolicy) -> Self {
        Self {
            best: BestResult::default(),
            best_score: 0.0,
            policy,
        }
    }

    /// Offer an attempt; returns true when it became the new best.
    ///
    /// The attempt's score must be strictly greater than the stored value,
    /// so on ties the earlier attempt stays. Under
    /// [`ComparisonPolicy::StoredConfidence`] the stored value is the best's
    /// confidence, not its score.
    pub fn offer(&mut self, attempt: &Attempt) -> bool {
        let score = attempt.score();
        let bar = match self.policy {
            ComparisonPolicy::StoredConfidence => self.best.confidence,
            ComparisonPolicy::StoredScore => self.best_score,
        };
        if score <= bar {
            return false;
        }

        if attempt.confidence < self.best.confidence {
            debug!(
                new_confidence = attempt.confidence,
                stored_confidence = self.best.confidence,
                score,
                "Replacing best with a lower-confidence attempt on length bonus"
            );
        }
        self.best = BestResult::from_attempt(attempt);
        self.best_score = score;
        true
    }

    /// True once the best has non-blank text.
    pub fn should_stop(&self) -> bool {
        self.best.has_text()
    }

    pub fn best(&self) -> &BestResult {
        &self.best
    }

    pub fn into_best(self) -> BestResult {
        self.best
    }
}

// ---------------------------------------------------------------------------
// Search engine
// ---------------------------------------------------------------------------

/// What one search did, besides its result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub best: BestResult,
    pub attempts: usize,
    pub skipped: usize,
    pub languages_tried: Vec<String>,
}

/// Drives a [`RecognitionEngine`] across a [`SearchPlan`].
#[derive(Clone)]
pub struct SearchEngine {
    engine: Arc<dyn RecognitionEngine>,
    plan: Arc<SearchPlan>,
}

impl SearchEngine {
    pub fn new(engine: Arc<dyn RecognitionEngine>, plan: Arc<SearchPlan>) -> Self {
        Self { engine, plan }
    }

    /// Search every language set in priority order over `variants`.
    ///
    /// Never fails: engine errors skip their attempt, and when every attempt
    /// fails the default (empty) result comes back.
    #[instrument(skip_all, fields(request_id = %request_id, engine = self.engine.name()))]
    pub async fn search(
        &self,
        request_id: RequestId,
        variants: &[PipelineVariant],
        whitelist: Option<&Whitelist>,
    ) -> SearchSummary {
        debug!(
            max_attempts = self.plan.max_attempts(),
            variants = variants.len(),
            "Starting search"
        );
        let mut best = BestSoFar::new(self.plan.comparison());
        let mut attempts = 0;
        let mut skipped = 0;
        let mut languages_tried = Vec::new();

        for language in self.plan.languages() {
            languages_tried.push(language.to_string());
            let combinations = self.plan.combinations(language, whitelist);
            debug!(language = %language, combinations = combinations.len(), "Searching language set");

            // `buffered` yields in submission order, so the fold sees the same
            // sequence at any concurrency.
            let mut outcomes = stream::iter(
                combinations
                    .into_iter()
                    .map(|combination| self.run_attempt(combination, variants)),
            )
            .buffered(self.plan.concurrency());

            while let Some(outcome) = outcomes.next().await {
                attempts += 1;
                match outcome {
                    AttemptOutcome::Recognized(attempt) => {
                        let replaced = best.offer(&attempt);
                        debug!(
                            variant = %attempt.variant,
                            config = %attempt.config_id,
                            confidence = attempt.confidence,
                            score = attempt.score(),
                            replaced,
                            "Attempt scored"
                        );
                    }
                    AttemptOutcome::Skipped {
                        variant,
                        config_id,
                        error,
                        ..
                    } => {
                        skipped += 1;
                        warn!(
                            variant = %variant,
                            config = %config_id,
                            error = %error,
                            "Attempt skipped"
                        );
                    }
                }
            }

            if best.should_stop() {
                info!(language = %language, "Text found; remaining language sets skipped");
                break;
            }
        }

        let best = best.into_best();
        info!(
            confidence = best.confidence,
            pipeline = %best.pipeline,
            config = %best.config_id,
            attempts,
            skipped,
            "Search finished"
        );
        SearchSummary {
            best,
            attempts,
            skipped,
            languages_tried,
        }
    }

    async fn run_attempt(
        &self,
        combination: Combination,
        variants: &[PipelineVariant],
    ) -> AttemptOutcome {
        let Combination {
            language,
            variant,
            config_id,
            config_string,
        } = combination;

        let result = match variants.iter().find(|candidate| candidate.kind == variant) {
            Some(rendering) => {
                let timeout = self.plan.attempt_timeout();
                let call = self
                    .engine
                    .recognize(&rendering.image, language.as_str(), &config_string);
                match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::TimedOut { after: timeout }),
                }
            }
            None => Err(EngineError::Failed {
                detail: format!("variant {variant} was not generated"),
            }),
        };

        match result {
            Ok(recognition) => AttemptOutcome::Recognized(Attempt::from_recognition(
                language,
                variant,
                config_id,
                recognition,
            )),
            Err(error) => AttemptOutcome::Skipped {
                language,
                variant,
                config_id,
                error,
            },
        }
    }
}
