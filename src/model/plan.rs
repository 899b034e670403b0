//! Subscription tiers and the per-tier synthesis profile

use super::issue::SourceType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription level controlling source vocabulary, issue volume and scan cadence.
///
/// Variants are declared in ascending order so `Ord` reflects tier rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Max,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Max => "max",
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// Synthesis parameters for this tier.
    pub fn profile(&self) -> &'static TierProfile {
        match self {
            Self::Free => &FREE_PROFILE,
            Self::Pro => &PRO_PROFILE,
            Self::Max => &MAX_PROFILE,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a plan name is not one of `free`, `pro`, `max`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan tier: {0}")]
pub struct UnknownPlan(pub String);

impl FromStr for PlanTier {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "max" => Ok(Self::Max),
            _ => Err(UnknownPlan(s.to_string())),
        }
    }
}

/// How aggressively the provider is told to consolidate similar feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupLevel {
    /// Distinct points only, no semantic consolidation or ranking
    None,
    /// Semantic duplicate detection, ranked by mention frequency
    Semantic,
    /// Advanced consolidation, ranked by frequency and sentiment
    Full,
}

/// What a tier may ask of the provider and how the response is trimmed.
#[derive(Debug)]
pub struct TierProfile {
    pub max_issues: usize,
    /// Labels the provider is told to use for `sources[].type`
    pub provider_labels: &'static [&'static str],
    /// Canonical types that survive tier filtering
    pub allowed_sources: &'static [SourceType],
    /// Canonical types that receive synthesized occurrence counts
    pub occurrence_sources: &'static [SourceType],
    pub dedup: DedupLevel,
    /// One line per channel describing the conceptual scan scope
    pub scan_scope: &'static [&'static str],
}

impl TierProfile {
    pub fn allows(&self, source_type: SourceType) -> bool {
        self.allowed_sources.contains(&source_type)
    }

    pub fn counts_occurrences(&self, source_type: SourceType) -> bool {
        self.occurrence_sources.contains(&source_type)
    }
}

static FREE_PROFILE: TierProfile = TierProfile {
    max_issues: 4,
    provider_labels: &["Google Article", "YouTube Transcript"],
    allowed_sources: &[SourceType::GoogleArticles, SourceType::YouTube],
    occurrence_sources: &[SourceType::GoogleArticles, SourceType::YouTube],
    dedup: DedupLevel::None,
    scan_scope: &[
        "Google Articles: Analyze up to 10 relevant review articles and blog posts.",
        "YouTube Transcripts: Analyze transcripts from up to 10 relevant YouTube videos.",
    ],
};

static PRO_PROFILE: TierProfile = TierProfile {
    max_issues: 10,
    provider_labels: &[
        "Google Article",
        "YouTube Transcript",
        "YouTube Comment",
        "Twitter Post",
    ],
    allowed_sources: &[SourceType::GoogleArticles, SourceType::YouTube, SourceType::Tweets],
    occurrence_sources: &[SourceType::GoogleArticles, SourceType::YouTube, SourceType::Tweets],
    dedup: DedupLevel::Semantic,
    scan_scope: &[
        "Google Articles: Analyze up to 50 relevant review articles and blog posts.",
        "YouTube (Transcripts & Comments): Analyze transcripts and a significant sample of comments from up to 50 relevant YouTube videos.",
        "Twitter: Scan up to 5,000 tweets and related discussions.",
    ],
};

static MAX_PROFILE: TierProfile = TierProfile {
    max_issues: 50,
    provider_labels: &[
        "Google Article",
        "YouTube Transcript",
        "YouTube Comment",
        "Twitter Post",
        "Reddit Post",
        "Trustpilot Review",
    ],
    allowed_sources: &SourceType::ALL,
    occurrence_sources: &SourceType::ALL,
    dedup: DedupLevel::Full,
    scan_scope: &[
        "Google Articles: Analyze up to 100 relevant review articles and blog posts.",
        "YouTube (Transcripts & Comments): Analyze transcripts and a significant sample of comments from up to 100 relevant YouTube videos.",
        "Twitter: Scan up to 10,000 tweets and related discussions.",
        "Reddit: Search relevant subreddits for up to 5,000 posts and comments.",
        "Trustpilot: Examine up to 5,000 product reviews.",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(PlanTier::Free < PlanTier::Pro);
        assert!(PlanTier::Pro < PlanTier::Max);
    }

    #[test]
    fn vocabulary_grows_with_tier() {
        let tiers = [PlanTier::Free, PlanTier::Pro, PlanTier::Max];
        for pair in tiers.windows(2) {
            let lower = pair[0].profile();
            let higher = pair[1].profile();
            assert!(lower.max_issues < higher.max_issues);
            for source in lower.allowed_sources {
                assert!(higher.allows(*source), "{} missing from {}", source, pair[1]);
            }
        }
    }

    #[test]
    fn occurrence_sources_are_subset_of_allowed() {
        for tier in [PlanTier::Free, PlanTier::Pro, PlanTier::Max] {
            let profile = tier.profile();
            for source in profile.occurrence_sources {
                assert!(profile.allows(*source));
            }
        }
    }

    #[test]
    fn parse_plan_is_case_insensitive() {
        assert_eq!("MAX".parse::<PlanTier>(), Ok(PlanTier::Max));
        assert_eq!(" pro ".parse::<PlanTier>(), Ok(PlanTier::Pro));
        assert!("enterprise".parse::<PlanTier>().is_err());
    }

    #[test]
    fn plan_serializes_lowercase() {
        let json = serde_json::to_string(&PlanTier::Pro).unwrap();
        assert_eq!(json, "\"pro\"");
    }
}
