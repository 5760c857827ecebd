// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Inkread.
//
// Two tiers: `InkreadError` ends a request, `EngineError` only ends one
// recognition attempt and is absorbed by the search loop.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Inkread operations.
#[derive(Debug, Error)]
pub enum InkreadError {
    // -- Input errors --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    // -- Processing errors --
    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    // -- Setup errors --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a single engine invocation for one (variant, config, language)
/// combination.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine processing failed: {detail}")]
    Failed { detail: String },

    #[error("engine call timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("could not start engine: {detail}")]
    Spawn { detail: String },

    #[error("unreadable engine output: {detail}")]
    Output { detail: String },
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InkreadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_image_display() {
        let err = InkreadError::InvalidImage("unknown format".into());
        assert_eq!(err.to_string(), "invalid image: unknown format");
    }

    #[test]
    fn timeout_display_mentions_seconds() {
        let err = EngineError::TimedOut {
            after: Duration::from_secs(60),
        };
        assert!(err.to_string().contains("60s"), "got: {err}");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: InkreadError = io.into();
        assert!(matches!(err, InkreadError::Io(_)));
    }
}
