//! Analysis orchestration
//!
//! `AnalysisCoordinator` is the single entry point for session operations:
//! it gates requests through the free-tier quota, registers drafts, calls the
//! synthesizer, commits results and persists the session after every change.

mod engine;
mod error;

pub use engine::{AnalysisCoordinator, AnalyzeOutcome, Clock, SkipReason};
pub use error::{AnalysisError, AnalysisResult};
