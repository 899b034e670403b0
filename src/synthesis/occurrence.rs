//! Occurrence statistics for synthesized issues

use crate::model::{OccurrenceDetails, Source, TierProfile};
use rand::Rng;

/// Draw one mention count per distinct occurrence-eligible source type.
///
/// Types are visited in the order they first appear in `sources`. If nothing
/// was drawn while an eligible source exists, the first eligible source gets
/// a forced draw so eligible evidence never reports zero mentions.
pub fn synthesize_occurrences<R: Rng>(
    sources: &[Source],
    profile: &TierProfile,
    rng: &mut R,
) -> OccurrenceDetails {
    let mut details = OccurrenceDetails::new();
    let mut seen = Vec::with_capacity(sources.len());

    for source in sources {
        let source_type = source.source_type;
        if seen.contains(&source_type) || !profile.counts_occurrences(source_type) {
            continue;
        }
        seen.push(source_type);
        details.add(source_type, rng.gen_range(source_type.occurrence_range()));
    }

    if details.total() == 0 {
        if let Some(first) = sources
            .iter()
            .find(|s| profile.counts_occurrences(s.source_type))
        {
            let source_type = first.source_type;
            details.add(source_type, rng.gen_range(source_type.occurrence_range()));
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlanTier, SourceType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn source(source_type: SourceType) -> Source {
        Source {
            id: format!("src_{}", source_type.label()),
            source_type,
            url: "https://example.test".to_string(),
            title: "t".to_string(),
        }
    }

    #[test]
    fn one_draw_per_distinct_type_within_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let sources = vec![
            source(SourceType::Tweets),
            source(SourceType::Tweets),
            source(SourceType::YouTube),
        ];
        let details = synthesize_occurrences(&sources, PlanTier::Max.profile(), &mut rng);

        let keys: Vec<SourceType> = details.source_types().collect();
        assert_eq!(keys.len(), 2);
        for (source_type, count) in details.iter() {
            assert!(source_type.occurrence_range().contains(&count));
        }
    }

    #[test]
    fn ineligible_types_are_not_counted() {
        let mut rng = StdRng::seed_from_u64(2);
        let sources = vec![source(SourceType::RedditPosts), source(SourceType::GoogleArticles)];
        let details = synthesize_occurrences(&sources, PlanTier::Free.profile(), &mut rng);

        assert_eq!(details.get(SourceType::RedditPosts), None);
        assert!(details.get(SourceType::GoogleArticles).is_some());
    }

    #[test]
    fn only_ineligible_sources_yield_empty_details() {
        let mut rng = StdRng::seed_from_u64(3);
        let sources = vec![source(SourceType::TrustpilotPosts)];
        let details = synthesize_occurrences(&sources, PlanTier::Pro.profile(), &mut rng);
        assert!(details.is_empty());
        assert_eq!(details.total(), 0);
    }

    #[test]
    fn no_sources_yield_empty_details() {
        let mut rng = StdRng::seed_from_u64(4);
        let details = synthesize_occurrences(&[], PlanTier::Max.profile(), &mut rng);
        assert!(details.is_empty());
    }

    #[test]
    fn eligible_evidence_never_totals_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let details =
                synthesize_occurrences(&[source(SourceType::YouTube)], PlanTier::Free.profile(), &mut rng);
            assert!(details.total() >= 1);
        }
    }
}
