//! Placeholder URL templates for synthesized sources
//!
//! Every source URL is one of a small set of per-type templates carrying a
//! random identifier. Provider URLs that already fit the template for their
//! canonical type are kept; anything else is regenerated.

use crate::model::SourceType;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex_lite::Regex;
use std::sync::OnceLock;

const ID_LEN: usize = 7;
const ARTICLE_PREFIX: &str = "https://example-news.com/review/";

/// Lowercased product name with whitespace runs collapsed to `-`.
pub fn product_slug(product_name: &str) -> String {
    product_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn random_id<R: Rng>(rng: &mut R) -> String {
    (0..ID_LEN).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn random_status_id<R: Rng>(rng: &mut R) -> u64 {
    rng.gen_range(10_000_000_000_000_000u64..100_000_000_000_000_000u64)
}

/// Fresh placeholder URL for `source_type`.
pub fn generate_url<R: Rng>(source_type: SourceType, slug: &str, rng: &mut R) -> String {
    match source_type {
        SourceType::YouTube => {
            format!("https://www.youtube.com/watch?v=example{}", random_id(rng))
        }
        SourceType::GoogleArticles => {
            format!("{}{}/{}", ARTICLE_PREFIX, slug, random_id(rng))
        }
        SourceType::RedditPosts => {
            let post = random_id(rng);
            let comment = random_id(rng);
            format!(
                "https://www.reddit.com/r/product_feedback/comments/{}/comment/another{}",
                post, comment
            )
        }
        SourceType::Tweets => {
            let user = random_id(rng);
            format!(
                "https://twitter.com/user{}/status/{}",
                user,
                random_status_id(rng)
            )
        }
        SourceType::TrustpilotPosts => {
            format!("https://www.trustpilot.com/reviews/{}", random_id(rng))
        }
    }
}

fn template(source_type: SourceType) -> &'static Regex {
    static YOUTUBE: OnceLock<Regex> = OnceLock::new();
    static REDDIT: OnceLock<Regex> = OnceLock::new();
    static TWEETS: OnceLock<Regex> = OnceLock::new();
    static TRUSTPILOT: OnceLock<Regex> = OnceLock::new();
    static ARTICLE_ID: OnceLock<Regex> = OnceLock::new();

    let (cell, pattern) = match source_type {
        SourceType::YouTube => (
            &YOUTUBE,
            r"^https://www\.youtube\.com/watch\?v=example[A-Za-z0-9]{5,7}$",
        ),
        SourceType::RedditPosts => (
            &REDDIT,
            r"^https://www\.reddit\.com/r/product_feedback/comments/[A-Za-z0-9]{5,7}/comment/another[A-Za-z0-9]{5,7}$",
        ),
        SourceType::Tweets => (
            &TWEETS,
            r"^https://twitter\.com/user[A-Za-z0-9]{5,7}/status/[0-9]{10,19}$",
        ),
        SourceType::TrustpilotPosts => (
            &TRUSTPILOT,
            r"^https://www\.trustpilot\.com/reviews/[A-Za-z0-9]{5,7}$",
        ),
        // Article URLs embed the product slug; only the trailing id is matched here.
        SourceType::GoogleArticles => (&ARTICLE_ID, r"^[A-Za-z0-9]{5,7}$"),
    };
    cell.get_or_init(|| Regex::new(pattern).expect("url template regex compiles"))
}

/// True if `url` already fits the template for `source_type`.
pub fn matches_template(source_type: SourceType, url: &str, slug: &str) -> bool {
    match source_type {
        SourceType::GoogleArticles => url
            .strip_prefix(ARTICLE_PREFIX)
            .and_then(|rest| rest.strip_prefix(slug))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|id| template(source_type).is_match(id)),
        _ => template(source_type).is_match(url),
    }
}

/// Keep a template-conforming URL, otherwise mint a fresh one.
pub fn canonicalize_url<R: Rng>(
    source_type: SourceType,
    url: &str,
    slug: &str,
    rng: &mut R,
) -> String {
    if matches_template(source_type, url, slug) {
        url.to_string()
    } else {
        generate_url(source_type, slug, rng)
    }
}
