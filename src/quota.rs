//! Free-tier usage limits
//!
//! Two independent rules apply to `free` plans only:
//! - at most one *new* investigation per rolling window, measured from the
//!   first scan of the cycle (not a calendar month)
//! - an existing investigation may be re-analyzed at most once per window,
//!   measured from its own last scan
//!
//! Evaluation is pure: callers pass the current state and receive the state to
//! persist alongside the verdict.

use crate::model::PlanTier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the free-tier quota window
pub fn quota_window() -> Duration {
    Duration::days(30)
}

/// Human-readable date used in quota messages, e.g. "June 14, 2025"
pub fn format_quota_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// Persisted free-tier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// New investigations started in the current window
    pub scans_this_month: u32,
    /// Start of the current window; `None` until the first scan of a cycle
    pub last_reset: Option<DateTime<Utc>>,
}

impl QuotaState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What the caller is about to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaCheck<'a> {
    /// No active investigation, or the active one is being pointed at a
    /// different product
    NewSession,
    /// The active investigation is re-run for the product it already holds
    Reanalysis {
        product_name: &'a str,
        last_scan: Option<DateTime<Utc>>,
    },
}

impl QuotaCheck<'_> {
    pub fn is_new_session(&self) -> bool {
        matches!(self, Self::NewSession)
    }
}

/// Outcome of a quota evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// State to persist, whether or not the request was allowed
    pub state: QuotaState,
    /// User-facing explanation when denied
    pub message: Option<String>,
    /// Earliest moment the denied request would be accepted
    pub next_available: Option<DateTime<Utc>>,
}

impl QuotaDecision {
    fn allow(state: QuotaState) -> Self {
        Self {
            allowed: true,
            state,
            message: None,
            next_available: None,
        }
    }

    fn deny(state: QuotaState, message: String, next_available: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            state,
            message: Some(message),
            next_available: Some(next_available),
        }
    }
}

/// Gate an analysis request against the free-tier limits.
///
/// Paid plans always pass and leave `state` untouched. Only an allowed
/// [`QuotaCheck::NewSession`] consumes quota.
pub fn evaluate(
    plan: PlanTier,
    check: &QuotaCheck<'_>,
    state: QuotaState,
    now: DateTime<Utc>,
) -> QuotaDecision {
    if !plan.is_free() {
        return QuotaDecision::allow(state);
    }

    match check {
        QuotaCheck::NewSession => evaluate_new_session(state, now),
        QuotaCheck::Reanalysis {
            product_name,
            last_scan,
        } => evaluate_reanalysis(product_name, *last_scan, state, now),
    }
}

fn evaluate_new_session(mut state: QuotaState, now: DateTime<Utc>) -> QuotaDecision {
    let expired = match state.last_reset {
        Some(start) => now - start > quota_window(),
        None => true,
    };
    if expired {
        state.scans_this_month = 0;
        state.last_reset = Some(now);
    }

    if state.scans_this_month >= 1 {
        let window_start = state.last_reset.unwrap_or(now);
        let next = window_start + quota_window();
        let message = format!(
            "Free tier allows one new product investigation per month. \
             Next new investigation available on {}. You can still re-analyze \
             existing products if their individual monthly limit hasn't been reached.",
            format_quota_date(next)
        );
        return QuotaDecision::deny(state, message, next);
    }

    state.scans_this_month = state.scans_this_month.saturating_add(1);
    QuotaDecision::allow(state)
}

fn evaluate_reanalysis(
    product_name: &str,
    last_scan: Option<DateTime<Utc>>,
    state: QuotaState,
    now: DateTime<Utc>,
) -> QuotaDecision {
    match last_scan {
        Some(scanned) if now - scanned < quota_window() => {
            let next = scanned + quota_window();
            let message = format!(
                "Free tier allows one manual analysis per month for \"{}\". \
                 Next analysis for this product available on {}.",
                product_name,
                format_quota_date(next)
            );
            QuotaDecision::deny(state, message, next)
        }
        _ => QuotaDecision::allow(state),
    }
}
