//! Filtering and trend summaries over synthesized issues

use crate::model::{Issue, IssueCategory, SourceType};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Number of most recent months kept by [`monthly_trend`]
pub const TREND_MONTHS: usize = 12;

/// Criteria for narrowing an issue list. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    /// Case-insensitive substring of the description
    pub keyword: Option<String>,
    pub category: Option<IssueCategory>,
    /// Matches a cited source of this type or a positive count from it
    pub source_type: Option<SourceType>,
    /// Inclusive lower bound on `last_detected`
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `last_detected`, covering the whole day
    pub end_date: Option<NaiveDate>,
}

impl IssueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn category(mut self, category: IssueCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            if !issue
                .description
                .to_lowercase()
                .contains(&keyword.to_lowercase())
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &issue.category != category {
                return false;
            }
        }
        if let Some(source_type) = self.source_type {
            if !issue.mentions(source_type) {
                return false;
            }
        }
        let day = issue.last_detected.date_naive();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }
        true
    }
}

/// Issues matching `filter`, in their original order.
pub fn filter_issues<'a>(issues: &'a [Issue], filter: &IssueFilter) -> Vec<&'a Issue> {
    issues.iter().filter(|issue| filter.matches(issue)).collect()
}

/// Issue count per category, in order of first appearance.
pub fn category_breakdown<'a, I>(issues: I) -> IndexMap<IssueCategory, usize>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut counts = IndexMap::new();
    for issue in issues {
        *counts.entry(issue.category.clone()).or_insert(0) += 1;
    }
    counts
}

/// Issue count per `YYYY-MM` of `last_detected`, ascending, keeping the most
/// recent [`TREND_MONTHS`] months that have any issues.
pub fn monthly_trend<'a, I>(issues: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for issue in issues {
        let key = issue.last_detected.format("%Y-%m").to_string();
        *counts.entry(key).or_insert(0) += 1;
    }
    let skip = counts.len().saturating_sub(TREND_MONTHS);
    counts.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueId, Source};
    use chrono::{TimeZone, Utc};

    fn issue(description: &str, category: IssueCategory, ymd: (i32, u32, u32)) -> Issue {
        Issue::new(
            IssueId::new(),
            description,
            category,
            vec![Source {
                id: "s0".to_string(),
                source_type: SourceType::YouTube,
                url: "https://www.youtube.com/watch?v=exampleAb12x".to_string(),
                title: "Transcript".to_string(),
            }],
            [(SourceType::Tweets, 80)].into_iter().collect(),
            Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 18, 30, 0).unwrap(),
        )
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("Battery drains overnight", IssueCategory::HardwareIssue, (2024, 5, 3)),
            issue("App crashes on login", IssueCategory::Bug, (2024, 5, 20)),
            issue("Wants a dark mode", IssueCategory::FeatureRequest, (2024, 7, 1)),
            issue("Crash when pairing", IssueCategory::Bug, (2025, 1, 9)),
        ]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let issues = sample();
        assert_eq!(filter_issues(&issues, &IssueFilter::new()).len(), 4);
    }

    #[test]
    fn keyword_is_case_insensitive() {
        let issues = sample();
        let hits = filter_issues(&issues, &IssueFilter::new().keyword("CRASH"));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn category_and_source_narrow_results() {
        let issues = sample();
        let bugs = filter_issues(&issues, &IssueFilter::new().category(IssueCategory::Bug));
        assert_eq!(bugs.len(), 2);

        let by_count = filter_issues(&issues, &IssueFilter::new().source_type(SourceType::Tweets));
        assert_eq!(by_count.len(), 4);
        let none = filter_issues(&issues, &IssueFilter::new().source_type(SourceType::RedditPosts));
        assert!(none.is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive_whole_days() {
        let issues = sample();
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        let filter = IssueFilter::new().between(day(2024, 5, 20), day(2024, 7, 1));
        let hits: Vec<&str> = filter_issues(&issues, &filter)
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(hits, vec!["App crashes on login", "Wants a dark mode"]);
    }

    #[test]
    fn breakdown_counts_per_category() {
        let issues = sample();
        let counts = category_breakdown(&issues);
        assert_eq!(counts.get(&IssueCategory::Bug), Some(&2));
        assert_eq!(counts.get(&IssueCategory::HardwareIssue), Some(&1));
        assert_eq!(counts.keys().next(), Some(&IssueCategory::HardwareIssue));
    }

    #[test]
    fn trend_is_monthly_ascending() {
        let issues = sample();
        let trend = monthly_trend(&issues);
        assert_eq!(
            trend,
            vec![
                ("2024-05".to_string(), 2),
                ("2024-07".to_string(), 1),
                ("2025-01".to_string(), 1),
            ]
        );
    }

    #[test]
    fn trend_keeps_most_recent_twelve_months() {
        let issues: Vec<Issue> = (1..=14)
            .map(|m| {
                let (year, month) = if m <= 12 { (2023, m) } else { (2024, m - 12) };
                issue("x", IssueCategory::Bug, (year, month, 1))
            })
            .collect();
        let trend = monthly_trend(&issues);
        assert_eq!(trend.len(), TREND_MONTHS);
        assert_eq!(trend[0].0, "2023-03");
        assert_eq!(trend[11].0, "2024-02");
    }
}
