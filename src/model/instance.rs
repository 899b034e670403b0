//! Investigation instance: one product under repeated analysis

use super::issue::Issue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an investigation instance
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create a new random InstanceId
    pub fn new() -> Self {
        Self(format!("inst_{}", Uuid::new_v4().simple()))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which result list an analysis targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Primary,
    Competitor,
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Competitor => f.write_str("competitor"),
        }
    }
}

/// One product investigation with its primary and competitor results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub product_name: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub has_searched: bool,
    #[serde(default)]
    pub last_scan_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_scan_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub competitor_product_name: Option<String>,
    #[serde(default)]
    pub competitor_issues: Vec<Issue>,
    #[serde(default)]
    pub is_competitor_loading: bool,
    #[serde(default)]
    pub competitor_error: Option<String>,
}

impl Instance {
    /// A blank investigation with a fresh id and no product
    pub fn new() -> Self {
        Self::with_id(InstanceId::new())
    }

    /// A blank investigation reusing an existing id
    pub fn with_id(id: InstanceId) -> Self {
        Self {
            id,
            product_name: String::new(),
            issues: Vec::new(),
            is_loading: false,
            error: None,
            has_searched: false,
            last_scan_timestamp: None,
            next_scan_due: None,
            competitor_product_name: None,
            competitor_issues: Vec::new(),
            is_competitor_loading: false,
            competitor_error: None,
        }
    }

    pub fn is_loading(&self, kind: AnalysisKind) -> bool {
        match kind {
            AnalysisKind::Primary => self.is_loading,
            AnalysisKind::Competitor => self.is_competitor_loading,
        }
    }

    pub fn issues(&self, kind: AnalysisKind) -> &[Issue] {
        match kind {
            AnalysisKind::Primary => &self.issues,
            AnalysisKind::Competitor => &self.competitor_issues,
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update applied through [`InstanceStore::update`](crate::InstanceStore::update).
///
/// `None` leaves a field untouched. Nullable fields use a nested `Option` so
/// they can be explicitly cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceUpdate {
    pub product_name: Option<String>,
    pub issues: Option<Vec<Issue>>,
    pub is_loading: Option<bool>,
    pub error: Option<Option<String>>,
    pub has_searched: Option<bool>,
    pub last_scan_timestamp: Option<Option<DateTime<Utc>>>,
    pub competitor_product_name: Option<Option<String>>,
    pub competitor_issues: Option<Vec<Issue>>,
    pub is_competitor_loading: Option<bool>,
    pub competitor_error: Option<Option<String>>,
}

impl InstanceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = Some(issues);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.is_loading = Some(loading);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn has_searched(mut self, searched: bool) -> Self {
        self.has_searched = Some(searched);
        self
    }

    pub fn last_scan(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_scan_timestamp = Some(at);
        self
    }

    pub fn competitor_name(mut self, name: Option<String>) -> Self {
        self.competitor_product_name = Some(name);
        self
    }

    pub fn competitor_issues(mut self, issues: Vec<Issue>) -> Self {
        self.competitor_issues = Some(issues);
        self
    }

    pub fn competitor_loading(mut self, loading: bool) -> Self {
        self.is_competitor_loading = Some(loading);
        self
    }

    pub fn competitor_error(mut self, error: Option<String>) -> Self {
        self.competitor_error = Some(error);
        self
    }

    /// Clear competitor name, results and error. The loading flag belongs
    /// to whichever competitor call is still running.
    pub fn clear_competitor(self) -> Self {
        self.competitor_name(None)
            .competitor_issues(Vec::new())
            .competitor_error(None)
    }

    /// Set the issue list of the given kind.
    pub fn issues_for(self, kind: AnalysisKind, issues: Vec<Issue>) -> Self {
        match kind {
            AnalysisKind::Primary => self.issues(issues),
            AnalysisKind::Competitor => self.competitor_issues(issues),
        }
    }

    /// Set the error of the given kind.
    pub fn error_for(self, kind: AnalysisKind, error: Option<String>) -> Self {
        match kind {
            AnalysisKind::Primary => self.error(error),
            AnalysisKind::Competitor => self.competitor_error(error),
        }
    }

    /// Set the loading flag of the given kind.
    pub fn loading_for(self, kind: AnalysisKind, loading: bool) -> Self {
        match kind {
            AnalysisKind::Primary => self.loading(loading),
            AnalysisKind::Competitor => self.competitor_loading(loading),
        }
    }

    /// Apply to an instance in place. Returns true if `last_scan_timestamp`
    /// changed, which obliges the caller to recompute `next_scan_due`.
    pub(crate) fn apply_to(self, instance: &mut Instance) -> bool {
        if let Some(v) = self.product_name {
            instance.product_name = v;
        }
        if let Some(v) = self.issues {
            instance.issues = v;
        }
        if let Some(v) = self.is_loading {
            instance.is_loading = v;
        }
        if let Some(v) = self.error {
            instance.error = v;
        }
        if let Some(v) = self.has_searched {
            instance.has_searched = v;
        }
        let mut scan_changed = false;
        if let Some(v) = self.last_scan_timestamp {
            scan_changed = instance.last_scan_timestamp != v;
            instance.last_scan_timestamp = v;
        }
        if let Some(v) = self.competitor_product_name {
            instance.competitor_product_name = v;
        }
        if let Some(v) = self.competitor_issues {
            instance.competitor_issues = v;
        }
        if let Some(v) = self.is_competitor_loading {
            instance.is_competitor_loading = v;
        }
        if let Some(v) = self.competitor_error {
            instance.competitor_error = v;
        }
        scan_changed
    }
}
