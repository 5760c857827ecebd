// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inkread-core: core types, search plan and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod plan;
pub mod types;

pub use config::{ComparisonPolicy, RecognizerConfig};
pub use error::{EngineError, InkreadError};
pub use plan::{Combination, SearchPlan};
pub use types::*;
