// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request entry point: decode, preprocess, search.

use std::sync::Arc;
use std::time::Instant;

use inkread_core::error::{InkreadError, Result};
use inkread_core::{BestResult, RecognizerConfig, RequestId, SearchPlan, SearchReport, Whitelist};
use inkread_vision::{PipelineVariant, Preprocessor, SourceImage};
use tracing::{Instrument, info, info_span};

use crate::engine::RecognitionEngine;
use crate::search::SearchEngine;

/// Turns image bytes into the best recognized text.
///
/// Holds no per-request state; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct Recognizer {
    search: SearchEngine,
    preprocessor: Preprocessor,
}

impl Recognizer {
    /// Validate `config` and build the search plan once.
    pub fn new(engine: Arc<dyn RecognitionEngine>, config: &RecognizerConfig) -> Result<Self> {
        let plan = SearchPlan::from_config(config)?;
        Ok(Self::with_plan(
            engine,
            plan,
            Preprocessor::new(config.target_long_side),
        ))
    }

    pub fn with_plan(
        engine: Arc<dyn RecognitionEngine>,
        plan: SearchPlan,
        preprocessor: Preprocessor,
    ) -> Self {
        Self {
            search: SearchEngine::new(engine, Arc::new(plan)),
            preprocessor,
        }
    }

    /// Recognize text in encoded image bytes.
    ///
    /// Fails only when the bytes are not a decodable image. Engine failures
    /// are absorbed; if nothing is recognized the result has empty text and
    /// zero confidence.
    pub async fn recognize(&self, data: &[u8], whitelist: Option<&str>) -> Result<BestResult> {
        Ok(self.recognize_with_report(data, whitelist).await?.best)
    }

    /// Like [`Recognizer::recognize`], with search diagnostics.
    pub async fn recognize_with_report(
        &self,
        data: &[u8],
        whitelist: Option<&str>,
    ) -> Result<SearchReport> {
        let request_id = RequestId::new();
        let span = info_span!("recognize", %request_id, data_len = data.len());
        async move {
            let started = Instant::now();
            let source = self.decode(data).await?;
            self.run(request_id, source, whitelist, started).await
        }
        .instrument(span)
        .await
    }

    /// Normalize, enhance and derive the variants off the async runtime.
    async fn prepare(&self, source: SourceImage) -> Result<Vec<PipelineVariant>> {
        let preprocessor = self.preprocessor;
        tokio::task::spawn_blocking(move || preprocessor.run(source))
            .await
            .map_err(|err| InkreadError::Internal(format!("preprocessing task failed: {}", err)))
    }

    async fn decode(&self, data: &[u8]) -> Result<SourceImage> {
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || SourceImage::decode(&data))
            .await
            .map_err(|err| InkreadError::Internal(format!("decode task failed: {}", err)))?
    }

    async fn run(
        &self,
        request_id: RequestId,
        source: SourceImage,
        whitelist: Option<&str>,
        started: Instant,
    ) -> Result<SearchReport> {
        let whitelist = Whitelist::parse(whitelist);
        let variants = self.prepare(source).await?;
        let summary = self
            .search
            .search(request_id, &variants, whitelist.as_ref())
            .await;
        drop(variants);

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            elapsed_ms,
            confidence = summary.best.confidence,
            "Recognition complete"
        );
        Ok(SearchReport {
            request_id,
            best: summary.best,
            attempts: summary.attempts,
            skipped: summary.skipped,
            languages_tried: summary.languages_tried,
            elapsed_ms,
        })
    }
}
