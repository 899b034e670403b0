//! Issue, source and occurrence records produced by synthesis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Canonical evidence channel.
///
/// Serializes as the display label (e.g. `"Google Articles"`) so persisted
/// occurrence maps keep human-readable keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "YouTube")]
    YouTube,
    #[serde(rename = "Google Articles")]
    GoogleArticles,
    #[serde(rename = "Reddit Posts")]
    RedditPosts,
    #[serde(rename = "Tweets")]
    Tweets,
    #[serde(rename = "Trustpilot Posts")]
    TrustpilotPosts,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        Self::YouTube,
        Self::GoogleArticles,
        Self::RedditPosts,
        Self::Tweets,
        Self::TrustpilotPosts,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::GoogleArticles => "Google Articles",
            Self::RedditPosts => "Reddit Posts",
            Self::Tweets => "Tweets",
            Self::TrustpilotPosts => "Trustpilot Posts",
        }
    }

    /// Plausible number of mentions a single issue draws from this channel.
    ///
    /// High-volume channels get wide ranges, long-form channels narrow ones.
    pub fn occurrence_range(&self) -> RangeInclusive<u32> {
        match self {
            Self::Tweets => 50..=2000,
            Self::RedditPosts => 20..=500,
            Self::TrustpilotPosts => 10..=300,
            Self::YouTube => 1..=30,
            Self::GoogleArticles => 1..=5,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Fixed issue taxonomy offered to the provider.
///
/// Labels outside the taxonomy are kept verbatim in `Other` so a provider
/// drifting off-list never loses information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueCategory {
    Bug,
    PerformanceIssue,
    UsabilityProblem,
    FeatureRequest,
    NegativeFeedback,
    DocumentationIssue,
    ConnectivityProblem,
    HardwareIssue,
    SoftwareGlitch,
    CustomerSupport,
    PricingConcern,
    MissingFeature,
    DesignFlaw,
    SecurityConcern,
    CompatibilityIssue,
    Other(String),
}

impl IssueCategory {
    pub const TAXONOMY: [IssueCategory; 15] = [
        Self::Bug,
        Self::PerformanceIssue,
        Self::UsabilityProblem,
        Self::FeatureRequest,
        Self::NegativeFeedback,
        Self::DocumentationIssue,
        Self::ConnectivityProblem,
        Self::HardwareIssue,
        Self::SoftwareGlitch,
        Self::CustomerSupport,
        Self::PricingConcern,
        Self::MissingFeature,
        Self::DesignFlaw,
        Self::SecurityConcern,
        Self::CompatibilityIssue,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Bug => "Bug",
            Self::PerformanceIssue => "Performance Issue",
            Self::UsabilityProblem => "Usability Problem",
            Self::FeatureRequest => "Feature Request",
            Self::NegativeFeedback => "Negative Feedback",
            Self::DocumentationIssue => "Documentation Issue",
            Self::ConnectivityProblem => "Connectivity Problem",
            Self::HardwareIssue => "Hardware Issue",
            Self::SoftwareGlitch => "Software Glitch",
            Self::CustomerSupport => "Customer Support",
            Self::PricingConcern => "Pricing Concern",
            Self::MissingFeature => "Missing Feature",
            Self::DesignFlaw => "Design Flaw",
            Self::SecurityConcern => "Security Concern",
            Self::CompatibilityIssue => "Compatibility Issue",
            Self::Other(label) => label,
        }
    }

    /// Match a label against the taxonomy, ignoring case and surrounding space.
    pub fn parse(label: &str) -> Self {
        let wanted = label.trim();
        Self::TAXONOMY
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .cloned()
            .unwrap_or_else(|| Self::Other(wanted.to_string()))
    }
}

impl From<String> for IssueCategory {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<IssueCategory> for String {
    fn from(c: IssueCategory) -> Self {
        c.label().to_string()
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    pub fn new() -> Self {
        Self(format!("issue_{}", Uuid::new_v4().simple()))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One piece of evidence backing an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub url: String,
    pub title: String,
}

/// Per-channel mention counts for one issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceDetails(BTreeMap<SourceType, u32>);

impl OccurrenceDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` mentions for `source_type`, saturating on overflow.
    pub fn add(&mut self, source_type: SourceType, count: u32) {
        let entry = self.0.entry(source_type).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    pub fn get(&self, source_type: SourceType) -> Option<u32> {
        self.0.get(&source_type).copied()
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }

    pub fn source_types(&self) -> impl Iterator<Item = SourceType> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceType, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SourceType, u32)> for OccurrenceDetails {
    fn from_iter<I: IntoIterator<Item = (SourceType, u32)>>(iter: I) -> Self {
        let mut details = Self::new();
        for (source_type, count) in iter {
            details.add(source_type, count);
        }
        details
    }
}

/// One synthesized feedback item.
///
/// `total_occurrences` is derived from `occurrence_details` on construction and
/// on deserialization, so a persisted total can never drift from its details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IssueRecord")]
pub struct Issue {
    pub id: IssueId,
    pub description: String,
    pub category: IssueCategory,
    pub sources: Vec<Source>,
    occurrence_details: OccurrenceDetails,
    total_occurrences: u64,
    pub last_detected: DateTime<Utc>,
}

impl Issue {
    pub fn new(
        id: IssueId,
        description: impl Into<String>,
        category: IssueCategory,
        sources: Vec<Source>,
        occurrence_details: OccurrenceDetails,
        last_detected: DateTime<Utc>,
    ) -> Self {
        let total_occurrences = occurrence_details.total();
        Self {
            id,
            description: description.into(),
            category,
            sources,
            occurrence_details,
            total_occurrences,
            last_detected,
        }
    }

    pub fn occurrence_details(&self) -> &OccurrenceDetails {
        &self.occurrence_details
    }

    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    /// True if the issue cites a source of this type or counted mentions from it
    pub fn mentions(&self, source_type: SourceType) -> bool {
        self.sources.iter().any(|s| s.source_type == source_type)
            || self.occurrence_details.get(source_type).unwrap_or(0) > 0
    }
}

#[derive(Deserialize)]
struct IssueRecord {
    id: IssueId,
    description: String,
    category: IssueCategory,
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(default)]
    occurrence_details: OccurrenceDetails,
    last_detected: DateTime<Utc>,
}

impl From<IssueRecord> for Issue {
    fn from(r: IssueRecord) -> Self {
        Issue::new(
            r.id,
            r.description,
            r.category,
            r.sources,
            r.occurrence_details,
            r.last_detected,
        )
    }
}

/// Stable sort, highest `total_occurrences` first.
pub fn sort_by_occurrences(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.total_occurrences.cmp(&a.total_occurrences));
}
