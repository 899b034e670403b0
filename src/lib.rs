//! Holmes: product feedback investigations
//!
//! Tracks a set of product investigations, synthesizes customer-feedback
//! issues for each through a text-generation provider, and enforces the
//! plan-tier rules around them.
//!
//! # Core Concepts
//!
//! - **Instances**: one investigation per product, plus an unregistered draft
//! - **Issues**: synthesized feedback items with per-channel occurrence counts
//! - **Plan tiers**: `free`, `pro`, `max`; they scope sources, volume, quota
//!   and scan cadence
//!
//! # Example
//!
//! ```
//! use holmes::{AnalysisCoordinator, FeedbackSynthesizer, MemoryStore, MockProvider, PlanTier};
//! use std::sync::Arc;
//!
//! let synthesizer = FeedbackSynthesizer::new(Arc::new(MockProvider::new()));
//! let coordinator =
//!     AnalysisCoordinator::load(Arc::new(MemoryStore::new()), synthesizer, PlanTier::Free).unwrap();
//! assert!(coordinator.active_id().is_none());
//! ```

pub mod config;
pub mod coordinator;
pub mod insights;
pub mod instances;
pub mod model;
pub mod provider;
pub mod quota;
pub mod schedule;
pub mod storage;
pub mod synthesis;

pub use config::{ConfigError, HolmesConfig};
pub use coordinator::{AnalysisCoordinator, AnalysisError, AnalysisResult, AnalyzeOutcome, SkipReason};
pub use insights::{category_breakdown, filter_issues, monthly_trend, IssueFilter};
pub use instances::{InstanceMap, InstanceStore};
pub use model::{
    AnalysisKind, Instance, InstanceId, InstanceUpdate, Issue, IssueCategory, IssueId,
    OccurrenceDetails, PlanTier, Source, SourceType,
};
pub use provider::{FeedbackProvider, GeminiConfig, GeminiProvider, MockProvider, ProviderError};
pub use quota::{QuotaCheck, QuotaDecision, QuotaState};
pub use schedule::compute_next_due;
pub use storage::{MemoryStore, OpenStore, Snapshot, SnapshotStore, SqliteStore, StorageError};
pub use synthesis::{FeedbackSynthesizer, SynthesisError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
