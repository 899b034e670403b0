use super::classify::classify_source_type;
use super::occurrence::synthesize_occurrences;
use super::prompt::build_prompt;
use super::response::{parse_response, RawIssue};
use super::urls::{canonicalize_url, product_slug};
use super::{SynthesisError, SynthesisResult};
use crate::model::{Issue, IssueCategory, IssueId, PlanTier, Source, TierProfile};
use crate::provider::FeedbackProvider;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// How far back a synthesized `last_detected` may fall.
pub const LAST_DETECTED_SPAN_DAYS: i64 = 730;

/// The only component that talks to the provider.
pub struct FeedbackSynthesizer {
    provider: Arc<dyn FeedbackProvider>,
    rng: Mutex<StdRng>,
}

impl FeedbackSynthesizer {
    pub fn new(provider: Arc<dyn FeedbackProvider>) -> Self {
        Self {
            provider,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic ids, URLs and counts for tests.
    pub fn with_seed(provider: Arc<dyn FeedbackProvider>, seed: u64) -> Self {
        Self {
            provider,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Ask the provider about `product_name` and build issues for `plan`.
    ///
    /// At most `plan.profile().max_issues` issues are returned, in provider order.
    pub async fn synthesize(&self, product_name: &str, plan: PlanTier) -> SynthesisResult<Vec<Issue>> {
        let profile = plan.profile();
        let prompt = build_prompt(product_name, profile);
        debug!(
            product = product_name,
            plan = %plan,
            provider = self.provider.name(),
            "requesting feedback synthesis"
        );

        let text = self.provider.generate(&prompt).await.map_err(|e| {
            warn!(product = product_name, error = %e, "provider call failed");
            SynthesisError::from_provider(product_name, e)
        })?;

        let raw = parse_response(&text).map_err(|e| {
            warn!(product = product_name, error = %e, "rejected provider response");
            e
        })?;
        if raw.len() > profile.max_issues {
            debug!(
                returned = raw.len(),
                limit = profile.max_issues,
                "truncating provider issues to tier limit"
            );
        }

        let slug = product_slug(product_name);
        let now = Utc::now();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let issues: Vec<Issue> = raw
            .into_iter()
            .take(profile.max_issues)
            .map(|r| build_issue(r, &slug, profile, now, &mut *rng))
            .collect();

        info!(product = product_name, plan = %plan, count = issues.len(), "synthesized issues");
        Ok(issues)
    }
}

fn build_issue<R: Rng>(
    raw: RawIssue,
    slug: &str,
    profile: &TierProfile,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Issue {
    let id = IssueId::new();
    let sources: Vec<Source> = raw
        .sources
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let source_type = classify_source_type(&s.source_type);
            Source {
                id: format!("{}_source_{}", id, index),
                source_type,
                url: canonicalize_url(source_type, &s.url, slug, rng),
                title: s.title,
            }
        })
        .collect();

    let kept = retain_tier_sources(sources, profile);
    let details = synthesize_occurrences(&kept, profile, rng);
    let last_detected = now - Duration::days(rng.gen_range(0..=LAST_DETECTED_SPAN_DAYS));

    Issue::new(
        id,
        raw.description,
        IssueCategory::parse(&raw.category),
        kept,
        details,
        last_detected,
    )
}

/// Keep sources the tier allows; if that leaves nothing, keep the first one.
fn retain_tier_sources(sources: Vec<Source>, profile: &TierProfile) -> Vec<Source> {
    let first = sources.first().cloned();
    let kept: Vec<Source> = sources
        .into_iter()
        .filter(|s| profile.allows(s.source_type))
        .collect();
    match (kept.is_empty(), first) {
        (true, Some(first)) => vec![first],
        _ => kept,
    }
}
