//! Automated scan cadence per plan tier

use crate::model::PlanTier;
use chrono::{DateTime, Duration, Utc};

/// Interval between automated scans on paid tiers
pub fn weekly_scan_interval() -> Duration {
    Duration::weeks(1)
}

/// When the next automated scan is due, if the tier has a cadence at all.
///
/// Free investigations are manual only. Paid tiers rescan weekly from the last
/// completed scan; an instance that was never scanned has nothing scheduled.
/// Callers must recompute rather than trust a stored value whenever the plan
/// or the last scan changes.
pub fn compute_next_due(
    plan: PlanTier,
    last_scan: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match plan {
        PlanTier::Free => None,
        PlanTier::Pro | PlanTier::Max => last_scan.map(|at| at + weekly_scan_interval()),
    }
}
