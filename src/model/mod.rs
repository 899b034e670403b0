//! Core data structures

mod instance;
mod issue;
mod plan;

pub use instance::{AnalysisKind, Instance, InstanceId, InstanceUpdate};
pub use issue::{
    sort_by_occurrences, Issue, IssueCategory, IssueId, OccurrenceDetails, Source, SourceType,
};
pub use plan::{DedupLevel, PlanTier, TierProfile, UnknownPlan};
