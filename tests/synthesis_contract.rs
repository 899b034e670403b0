//! Synthesis behavior seen from outside the crate: tier scoping of sources
//! and occurrence counts, and how provider failures land on instances.
//!
//! Run with: `cargo test --test synthesis_contract`

mod common;

use common::{Session, ACME_FREE, MISSING_CATEGORY, RIVAL_MAX};
use holmes::{
    AnalysisError, AnalysisKind, FeedbackSynthesizer, IssueCategory, MockProvider, PlanTier,
    ProviderError, SourceType, SynthesisError,
};
use std::sync::Arc;

#[tokio::test]
async fn free_tier_issues_cite_only_articles_and_transcripts() {
    let provider = Arc::new(MockProvider::new().with_response(ACME_FREE));
    let synthesizer = FeedbackSynthesizer::with_seed(provider.clone(), 7);

    let issues = synthesizer.synthesize("Acme Widget", PlanTier::Free).await.unwrap();

    assert!(issues.len() <= 4);
    assert_eq!(issues.len(), 3);
    let allowed = [SourceType::GoogleArticles, SourceType::YouTube];
    for issue in &issues {
        assert!(!issue.sources.is_empty());
        for source in &issue.sources {
            assert!(allowed.contains(&source.source_type), "{} kept", source.source_type);
        }
        for source_type in issue.occurrence_details().source_types() {
            assert!(allowed.contains(&source_type));
        }
        assert!(issue.total_occurrences() > 0);
    }

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Acme Widget"));
    assert!(!prompt.contains("Reddit"));
    assert!(!prompt.contains("Trustpilot"));
}

#[tokio::test]
async fn off_template_article_urls_are_rewritten_with_product_slug() {
    let provider = Arc::new(MockProvider::new().with_response(ACME_FREE));
    let synthesizer = FeedbackSynthesizer::with_seed(provider, 3);

    let issues = synthesizer.synthesize("Acme Widget", PlanTier::Free).await.unwrap();

    let setup = issues
        .iter()
        .find(|i| i.category == IssueCategory::UsabilityProblem)
        .unwrap();
    assert_eq!(setup.sources.len(), 1);
    assert!(setup.sources[0]
        .url
        .starts_with("https://example-news.com/review/acme-widget/"));
    assert_eq!(setup.sources[0].title, "Setting up the Acme Widget");

    // URLs already on template survive untouched
    let battery = issues
        .iter()
        .find(|i| i.category == IssueCategory::HardwareIssue)
        .unwrap();
    assert_eq!(
        battery.sources[0].url,
        "https://example-news.com/review/acme-widget/Ab3dE9x"
    );
}

#[tokio::test]
async fn max_tier_counts_every_channel() {
    let provider = Arc::new(MockProvider::new().with_response(RIVAL_MAX));
    let synthesizer = FeedbackSynthesizer::with_seed(provider, 11);

    let issues = synthesizer.synthesize("Rival Gadget", PlanTier::Max).await.unwrap();

    let pricing = issues
        .iter()
        .find(|i| i.category == IssueCategory::PricingConcern)
        .unwrap();
    let types: Vec<SourceType> = pricing.sources.iter().map(|s| s.source_type).collect();
    assert_eq!(types, vec![SourceType::RedditPosts, SourceType::TrustpilotPosts]);
    assert!(pricing.occurrence_details().get(SourceType::RedditPosts).is_some());
    assert!(pricing.occurrence_details().get(SourceType::TrustpilotPosts).is_some());

    let support = issues
        .iter()
        .find(|i| i.category == IssueCategory::CustomerSupport)
        .unwrap();
    assert_eq!(support.sources[0].source_type, SourceType::YouTube);
}

#[tokio::test]
async fn missing_category_rejects_response_and_keeps_previous_issues() {
    let session = Session::new();
    let provider = MockProvider::new()
        .with_response(ACME_FREE)
        .with_response(MISSING_CATEGORY);
    let coordinator = session.open(provider, PlanTier::Pro);

    coordinator.analyze("Acme Widget", AnalysisKind::Primary).await.unwrap();
    let before = coordinator.active().unwrap();
    assert_eq!(before.issues.len(), 3);

    let err = coordinator
        .analyze("Acme Widget", AnalysisKind::Primary)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::ResponseFormat(_)));

    let after = coordinator.active().unwrap();
    assert_eq!(after.issues, before.issues);
    assert_eq!(after.last_scan_timestamp, before.last_scan_timestamp);
    assert!(!after.is_loading);
    assert!(after.error.unwrap().contains("AI response format issue"));
}

#[tokio::test]
async fn bare_missing_category_is_a_format_error() {
    let provider = Arc::new(MockProvider::new().with_response(r#"[{"description":"x","sources":[]}]"#));
    let synthesizer = FeedbackSynthesizer::with_seed(provider, 1);

    let err = synthesizer.synthesize("Acme Widget", PlanTier::Free).await.unwrap_err();
    assert!(matches!(err, SynthesisError::ResponseFormat(_)));
}

#[tokio::test]
async fn failed_primary_clears_results_but_failed_competitor_keeps_them() {
    let session = Session::new();
    let provider = MockProvider::new()
        .with_response(ACME_FREE)
        .with_response(RIVAL_MAX)
        .with_failure(ProviderError::Network("connection reset".to_string()))
        .with_failure(ProviderError::Network("connection reset".to_string()));
    let coordinator = session.open(provider, PlanTier::Max);

    coordinator.analyze("Acme Widget", AnalysisKind::Primary).await.unwrap();
    coordinator.analyze("Rival Gadget", AnalysisKind::Competitor).await.unwrap();
    let competitor_issues = coordinator.active().unwrap().competitor_issues;
    assert_eq!(competitor_issues.len(), 2);

    let err = coordinator
        .analyze("Rival Gadget", AnalysisKind::Competitor)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Provider(_)));
    let active = coordinator.active().unwrap();
    assert_eq!(active.competitor_issues, competitor_issues);
    assert!(active.competitor_error.is_some());
    assert!(!active.is_competitor_loading);
    assert_eq!(active.issues.len(), 3);

    let err = coordinator
        .analyze("Acme Widget", AnalysisKind::Primary)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Provider(_)));
    let active = coordinator.active().unwrap();
    assert!(active.issues.is_empty());
    assert_eq!(active.last_scan_timestamp, None);
    assert_eq!(active.next_scan_due, None);
    assert!(active
        .error
        .unwrap()
        .contains("unexpected snag while investigating \"Acme Widget\""));
}

#[tokio::test]
async fn rejected_credential_is_a_configuration_error() {
    let session = Session::new();
    let provider = MockProvider::new()
        .with_failure(ProviderError::MissingCredential("API key rejected".to_string()));
    let coordinator = session.open(provider, PlanTier::Pro);

    let err = coordinator
        .analyze("Acme Widget", AnalysisKind::Primary)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Configuration(_)));
    let active = coordinator.active().unwrap();
    assert!(active.error.unwrap().starts_with("Live analysis unavailable"));
}
