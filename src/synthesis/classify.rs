//! Provider source label → canonical `SourceType`

use crate::model::SourceType;
use tracing::warn;

/// Keyword rules, checked in order against the lowercased label.
///
/// "youtube" comes first so "YouTube Comment" never falls through to a later
/// rule; "article" precedes the social channels.
const KEYWORD_RULES: &[(&[&str], SourceType)] = &[
    (&["youtube"], SourceType::YouTube),
    (&["google article", "article"], SourceType::GoogleArticles),
    (&["reddit"], SourceType::RedditPosts),
    (&["twitter", "tweet"], SourceType::Tweets),
    (&["trustpilot"], SourceType::TrustpilotPosts),
];

/// Type used when a label matches nothing.
pub const DEFAULT_SOURCE_TYPE: SourceType = SourceType::GoogleArticles;

/// Match a label against the keyword rules, then against display labels.
pub fn match_source_type(label: &str) -> Option<SourceType> {
    let lowered = label.trim().to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, source_type)| *source_type)
        .or_else(|| {
            SourceType::ALL
                .iter()
                .copied()
                .find(|st| st.label().eq_ignore_ascii_case(&lowered))
        })
}

/// Canonicalize a provider label, falling back to `DEFAULT_SOURCE_TYPE`.
pub fn classify_source_type(label: &str) -> SourceType {
    match_source_type(label).unwrap_or_else(|| {
        warn!(label, fallback = %DEFAULT_SOURCE_TYPE, "unrecognized source type label");
        DEFAULT_SOURCE_TYPE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_vocabulary_maps_to_canonical_types() {
        let cases = [
            ("Google Article", SourceType::GoogleArticles),
            ("YouTube Transcript", SourceType::YouTube),
            ("YouTube Comment", SourceType::YouTube),
            ("Twitter Post", SourceType::Tweets),
            ("Reddit Post", SourceType::RedditPosts),
            ("Trustpilot Review", SourceType::TrustpilotPosts),
        ];
        for (label, expected) in cases {
            assert_eq!(classify_source_type(label), expected, "label {label}");
        }
    }

    #[test]
    fn display_labels_map_to_themselves() {
        for source_type in SourceType::ALL {
            assert_eq!(classify_source_type(source_type.label()), source_type);
        }
    }

    #[test]
    fn matching_ignores_case_and_padding() {
        assert_eq!(classify_source_type("  youtube video "), SourceType::YouTube);
        assert_eq!(classify_source_type("TWEET"), SourceType::Tweets);
        assert_eq!(classify_source_type("r/reddit thread"), SourceType::RedditPosts);
    }

    #[test]
    fn earlier_rules_win_on_ambiguous_labels() {
        assert_eq!(classify_source_type("YouTube article"), SourceType::YouTube);
        assert_eq!(classify_source_type("Article on Reddit"), SourceType::GoogleArticles);
        assert_eq!(classify_source_type("Tweet about Trustpilot"), SourceType::Tweets);
    }

    #[test]
    fn unknown_label_falls_back_to_articles() {
        assert_eq!(match_source_type("Podcast Episode"), None);
        assert_eq!(classify_source_type("Podcast Episode"), SourceType::GoogleArticles);
        assert_eq!(classify_source_type(""), SourceType::GoogleArticles);
    }
}
