//! Common test utilities for Holmes integration tests
//!
//! Canned provider responses plus a harness that runs a coordinator over a
//! SQLite file in a temp directory with a hand-driven clock.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use holmes::{AnalysisCoordinator, FeedbackSynthesizer, MockProvider, OpenStore, PlanTier, SqliteStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Free-tier answer for "Acme Widget"; the tweet is off-tier for free plans
pub const ACME_FREE: &str = r#"```json
[
  {
    "description": "Battery drains within a few hours of light use",
    "category": "Hardware Issue",
    "sources": [
      {"type": "Google Article", "url": "https://example-news.com/review/acme-widget/Ab3dE9x", "title": "Acme Widget long-term review"}
    ]
  },
  {
    "description": "Companion app crashes when pairing",
    "category": "Bug",
    "sources": [
      {"type": "YouTube Transcript", "url": "https://www.youtube.com/watch?v=exampleQw3rTy7", "title": "Acme Widget teardown"}
    ]
  },
  {
    "description": "Setup instructions are confusing",
    "category": "Usability Problem",
    "sources": [
      {"type": "Twitter Post", "url": "https://twitter.com/userAbc1234/status/12345678901234567", "title": "Setup rant"},
      {"type": "Article", "url": "https://blog.example.org/acme-setup", "title": "Setting up the Acme Widget"}
    ]
  }
]
```"#;

/// Max-tier answer citing every channel
pub const RIVAL_MAX: &str = r#"[
  {
    "description": "Subscription price increased without notice",
    "category": "Pricing Concern",
    "sources": [
      {"type": "Reddit Post", "url": "https://www.reddit.com/r/product_feedback/comments/Pq12345/comment/anotherZz98765", "title": "Price hike thread"},
      {"type": "Trustpilot Review", "url": "https://www.trustpilot.com/reviews/Tr0st12", "title": "One star"}
    ]
  },
  {
    "description": "Support takes weeks to reply",
    "category": "Customer Support",
    "sources": [
      {"type": "YouTube Comment", "url": "https://www.youtube.com/watch?v=exampleYt1Cmt2", "title": "Comments on review"}
    ]
  }
]"#;

/// Second issue is missing its category
pub const MISSING_CATEGORY: &str = r#"[
  {"description": "Fine", "category": "Bug", "sources": [{"type": "Google Article", "url": "https://a.example/x", "title": "t"}]},
  {"description": "Broken", "sources": [{"type": "Google Article", "url": "https://a.example/y", "title": "t"}]}
]"#;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

/// A SQLite-backed session that can be closed and reopened.
pub struct Session {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub now: Arc<Mutex<DateTime<Utc>>>,
}

impl Session {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("holmes.db");
        Self {
            _dir: dir,
            db_path,
            now: Arc::new(Mutex::new(start_time())),
        }
    }

    /// Open a coordinator over the session database.
    ///
    /// `default_plan` only applies while nothing has been saved yet.
    pub fn open(&self, provider: MockProvider, default_plan: PlanTier) -> AnalysisCoordinator {
        let store = SqliteStore::open(&self.db_path).unwrap();
        let clock = self.now.clone();
        AnalysisCoordinator::load(
            Arc::new(store),
            FeedbackSynthesizer::with_seed(Arc::new(provider), 42),
            default_plan,
        )
        .unwrap()
        .with_clock(move || *clock.lock().unwrap())
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}
