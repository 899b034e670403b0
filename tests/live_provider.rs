//! Live provider check against the real Gemini endpoint.
//!
//! Run with: `GEMINI_API_KEY=... cargo test --features real_provider --test live_provider -- --nocapture`

#![cfg(feature = "real_provider")]

use holmes::{FeedbackSynthesizer, GeminiConfig, GeminiProvider, PlanTier};
use std::sync::Arc;

#[tokio::test]
async fn free_tier_synthesis_round_trip() {
    let provider = GeminiProvider::from_env(GeminiConfig::default());
    if !provider.has_credential() {
        eprintln!("GEMINI_API_KEY not set, skipping live provider check");
        return;
    }
    let synthesizer = FeedbackSynthesizer::new(Arc::new(provider));

    let issues = synthesizer.synthesize("Acme Widget", PlanTier::Free).await.unwrap();

    eprintln!("live provider returned {} issues", issues.len());
    assert!(issues.len() <= PlanTier::Free.profile().max_issues);
    for issue in &issues {
        eprintln!("  [{}] {}", issue.category, issue.description);
        for source_type in issue.occurrence_details().source_types() {
            assert!(PlanTier::Free.profile().counts_occurrences(source_type));
        }
    }
}
