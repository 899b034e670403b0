//! Tier-scoped request text sent to the provider

use super::urls::product_slug;
use crate::model::{DedupLevel, IssueCategory, SourceType, TierProfile};

fn dedup_instructions(level: DedupLevel) -> &'static str {
    match level {
        DedupLevel::None => {
            "Focus on clear, distinct issues or feature requests. Identify as many unique \
             and relevant points as possible, up to the maximum for this tier. Avoid overly \
             similar points. Do not perform semantic duplicate detection or prioritization."
        }
        DedupLevel::Semantic => {
            "Use semantic duplicate detection to consolidate similar feedback into single, \
             well-defined issues. Prioritize issues by their mention frequency across the \
             scanned sources."
        }
        DedupLevel::Full => {
            "Use advanced semantic duplicate detection to consolidate similar feedback into \
             single, well-defined issues. Prioritize issues by mention frequency and sentiment \
             across all scanned sources, without sacrificing distinctiveness."
        }
    }
}

fn url_pattern(source_type: SourceType, slug: &str) -> String {
    match source_type {
        SourceType::YouTube => {
            "YouTube: https://www.youtube.com/watch?v=example[RANDOM_ID]".to_string()
        }
        SourceType::GoogleArticles => format!(
            "Google Article: https://example-news.com/review/{}/[RANDOM_ID]",
            slug
        ),
        SourceType::RedditPosts => "Reddit Post: https://www.reddit.com/r/product_feedback/comments/[RANDOM_ID]/comment/another[RANDOM_ID]".to_string(),
        SourceType::Tweets => "Twitter Post: https://twitter.com/user[RANDOM_ID]/status/[RANDOM_NUMERIC_ID]".to_string(),
        SourceType::TrustpilotPosts => {
            "Trustpilot Review: https://www.trustpilot.com/reviews/[RANDOM_ID]".to_string()
        }
    }
}

/// Build the request for `product_name` under `profile`.
pub fn build_prompt(product_name: &str, profile: &TierProfile) -> String {
    let slug = product_slug(product_name);
    let categories = IssueCategory::TAXONOMY
        .iter()
        .map(|c| format!("\"{}\"", c.label()))
        .collect::<Vec<_>>()
        .join(", ");
    let labels = profile
        .provider_labels
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect::<Vec<_>>()
        .join(", ");
    let scan_scope: String = profile
        .scan_scope
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}\n", i + 1, line))
        .collect();
    let url_patterns: String = profile
        .allowed_sources
        .iter()
        .map(|source_type| format!("  {}\n", url_pattern(*source_type, &slug)))
        .collect();

    format!(
        "You are ProductHolmes, an analyst of customer feedback for new products.\n\
         For the product \"{product}\", identify DISTINCT issues, problems, bugs, negative \
         feedback and significant feature requests. Prefer actionable insights over generic \
         praise.\n\
         \n\
         Scan these conceptual sources for public feedback from the last 1-2 years:\n\
         {scan_scope}\
         {dedup}\n\
         \n\
         Return up to {max} distinct issues. If fewer genuinely distinct issues exist, return \
         only those; never pad the list with minor variations.\n\
         For each issue provide:\n\
         - \"description\": one or two sentences specific to \"{product}\".\n\
         - \"category\": exactly one of {categories}.\n\
         - \"sources\": 2-4 simulated sources, each with \"type\" (strictly one of [{labels}]), \
         \"url\" and a concise \"title\".\n\
         Source URLs must be fictional placeholders following these patterns, with \
         [RANDOM_ID] a unique 5-7 character alphanumeric string:\n\
         {url_patterns}\
         \n\
         Respond with ONLY a JSON array of objects shaped as \
         {{\"description\": string, \"category\": string, \"sources\": [{{\"type\": string, \
         \"url\": string, \"title\": string}}]}}. No explanatory text and no markdown fences.\n",
        product = product_name,
        dedup = dedup_instructions(profile.dedup),
        max = profile.max_issues,
    )
}
