use super::error::{AnalysisError, AnalysisResult};
use crate::instances::{InstanceMap, InstanceStore};
use crate::model::{AnalysisKind, Instance, InstanceId, InstanceUpdate, Issue, IssueId, PlanTier};
use crate::quota::{self, QuotaCheck, QuotaState};
use crate::storage::{Snapshot, SnapshotStore};
use crate::synthesis::{FeedbackSynthesizer, SynthesisError, SynthesisResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Source of "now" for quota and scan timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Why an analyze call returned without contacting the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyName,
    /// The same kind is already in flight for the target instance
    AlreadyLoading,
}

/// Result of a completed analyze call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    Completed {
        instance_id: InstanceId,
        issue_count: usize,
    },
    Skipped(SkipReason),
    /// The result no longer applies: the instance was deleted, or its
    /// competitor was cleared or restarted while the provider was working
    Discarded { instance_id: InstanceId },
}

/// An analysis that passed its gates and is waiting on the provider
struct Dispatch {
    instance_id: InstanceId,
    plan: PlanTier,
    /// Competitor run token, checked again before committing
    run: Option<u64>,
}

struct Session {
    store: InstanceStore,
    quota: QuotaState,
    /// Live competitor run per instance. A finishing call whose token is
    /// missing here, or replaced, is stale.
    competitor_runs: HashMap<InstanceId, u64>,
    next_run: u64,
}

impl Session {
    fn new(store: InstanceStore, quota: QuotaState) -> Self {
        Self {
            store,
            quota,
            competitor_runs: HashMap::new(),
            next_run: 0,
        }
    }

    fn start_competitor_run(&mut self, instance_id: &InstanceId) -> u64 {
        let run = self.next_run;
        self.next_run += 1;
        self.competitor_runs.insert(instance_id.clone(), run);
        run
    }

    /// Make any in-flight competitor call for `instance_id` stale.
    fn invalidate_competitor(&mut self, instance_id: &InstanceId) {
        if self.competitor_runs.remove(instance_id).is_some() {
            debug!(instance = %instance_id, "in-flight competitor analysis invalidated");
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            quota: self.quota,
            ..self.store.to_snapshot()
        }
    }

    /// Apply `update` to whatever is active, draft or registered.
    fn update_active(&mut self, update: InstanceUpdate) {
        match self.store.active_id().cloned() {
            Some(id) => {
                self.store.update(&id, update);
            }
            None => {
                self.store.update_draft(update);
            }
        }
    }
}

/// Orchestrates analyses over one persisted session.
///
/// Session state sits behind a mutex that is never held across the provider
/// call, so reads stay available while an analysis is in flight.
pub struct AnalysisCoordinator {
    session: Mutex<Session>,
    storage: Arc<dyn SnapshotStore>,
    synthesizer: FeedbackSynthesizer,
    clock: Clock,
}

impl AnalysisCoordinator {
    /// Start a session from whatever `storage` holds, or a blank one on
    /// `default_plan` if it holds nothing.
    pub fn load(
        storage: Arc<dyn SnapshotStore>,
        synthesizer: FeedbackSynthesizer,
        default_plan: PlanTier,
    ) -> AnalysisResult<Self> {
        let session = match storage.load()? {
            Some(snapshot) => {
                debug!(
                    instances = snapshot.instances.len(),
                    plan = %snapshot.plan,
                    "restored session"
                );
                Session::new(InstanceStore::restore(&snapshot, snapshot.plan), snapshot.quota)
            }
            None => Session::new(InstanceStore::new(default_plan), QuotaState::new()),
        };

        Ok(Self {
            session: Mutex::new(session),
            storage,
            synthesizer,
            clock: Arc::new(Utc::now),
        })
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, session: &Session) -> AnalysisResult<()> {
        self.storage.save(&session.snapshot())?;
        Ok(())
    }

    // --- Analysis ---

    /// Analyze `product_name` into the active instance.
    ///
    /// Primary analysis of a draft registers it before the provider is
    /// called. Results are committed to the instance the call started on,
    /// even if another instance has been selected meanwhile.
    pub async fn analyze(
        &self,
        product_name: &str,
        kind: AnalysisKind,
    ) -> AnalysisResult<AnalyzeOutcome> {
        let name = product_name.trim();
        if name.is_empty() {
            return Ok(AnalyzeOutcome::Skipped(SkipReason::EmptyName));
        }

        let started = match kind {
            AnalysisKind::Primary => self.begin_primary(name)?,
            AnalysisKind::Competitor => self.begin_competitor(name)?,
        };
        let Some(dispatch) = started else {
            debug!(product = name, %kind, "analysis already in flight, ignoring request");
            return Ok(AnalyzeOutcome::Skipped(SkipReason::AlreadyLoading));
        };

        let result = self.synthesizer.synthesize(name, dispatch.plan).await;
        self.finish(dispatch, kind, result)
    }

    /// Gate, register and flag a primary analysis. `None` if one is running.
    fn begin_primary(&self, name: &str) -> AnalysisResult<Option<Dispatch>> {
        let mut session = self.lock();
        let now = (self.clock)();
        let plan = session.store.plan();

        if session
            .store
            .active()
            .is_some_and(|i| i.is_loading(AnalysisKind::Primary))
        {
            return Ok(None);
        }

        let active_id = session.store.active_id().cloned();
        let check = match active_id.as_ref().and_then(|id| session.store.get(id)) {
            Some(instance) if instance.product_name == name => QuotaCheck::Reanalysis {
                product_name: name,
                last_scan: instance.last_scan_timestamp,
            },
            _ => QuotaCheck::NewSession,
        };
        let is_new_session = check.is_new_session();

        let decision = quota::evaluate(plan, &check, session.quota, now);
        session.quota = decision.state;
        if !decision.allowed {
            let message = decision.message.unwrap_or_default();
            info!(product = name, new_session = is_new_session, "free-tier quota denied analysis");
            session.update_active(InstanceUpdate::new().error(Some(message.clone())).loading(false));
            self.persist(&session)?;
            return Err(AnalysisError::QuotaExceeded {
                message,
                next_available: decision.next_available,
            });
        }

        let start = InstanceUpdate::new()
            .product_name(name)
            .loading(true)
            .error(None)
            .has_searched(true)
            .clear_competitor();

        let instance_id = match active_id {
            None => session
                .store
                .register_draft(start)
                .map(|instance| instance.id)
                .ok_or(AnalysisError::NoPrimaryInstance)?,
            Some(id) => {
                let renamed = session
                    .store
                    .get(&id)
                    .is_some_and(|i| i.product_name != name);
                let update = if renamed {
                    debug!(instance = %id, product = name, "investigation renamed, resetting results");
                    start.issues(Vec::new()).last_scan(None)
                } else {
                    start
                };
                session.store.update(&id, update);
                id
            }
        };
        session.invalidate_competitor(&instance_id);

        self.persist(&session)?;
        Ok(Some(Dispatch {
            instance_id,
            plan,
            run: None,
        }))
    }

    /// Gate and flag a competitor analysis. `None` if one is running.
    fn begin_competitor(&self, name: &str) -> AnalysisResult<Option<Dispatch>> {
        let mut session = self.lock();
        let plan = session.store.plan();

        if plan != PlanTier::Max {
            let error = AnalysisError::UpgradeRequired;
            session.update_active(InstanceUpdate::new().competitor_error(Some(error.to_string())));
            self.persist(&session)?;
            return Err(error);
        }

        let Some(instance_id) = session.store.active_id().cloned() else {
            let error = AnalysisError::NoPrimaryInstance;
            session.store.update_draft(
                InstanceUpdate::new().competitor_error(Some(error.to_string())),
            );
            return Err(error);
        };

        if session
            .store
            .get(&instance_id)
            .is_some_and(|i| i.is_loading(AnalysisKind::Competitor))
        {
            return Ok(None);
        }

        let run = session.start_competitor_run(&instance_id);
        session.store.update(
            &instance_id,
            InstanceUpdate::new()
                .competitor_loading(true)
                .competitor_error(None)
                .competitor_name(Some(name.to_string())),
        );
        self.persist(&session)?;
        Ok(Some(Dispatch {
            instance_id,
            plan,
            run: Some(run),
        }))
    }

    /// Commit a synthesis result to the originating instance.
    fn finish(
        &self,
        dispatch: Dispatch,
        kind: AnalysisKind,
        result: SynthesisResult<Vec<Issue>>,
    ) -> AnalysisResult<AnalyzeOutcome> {
        let mut session = self.lock();
        let now = (self.clock)();
        let instance_id = dispatch.instance_id;

        if !session.store.contains(&instance_id) {
            warn!(instance = %instance_id, %kind, "instance deleted during analysis, discarding result");
            return match result {
                Ok(_) => Ok(AnalyzeOutcome::Discarded { instance_id }),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(run) = dispatch.run {
            if session.competitor_runs.get(&instance_id) != Some(&run) {
                warn!(instance = %instance_id, run, "competitor changed during analysis, discarding result");
                // A newer run owns the flag if one has started since.
                if !session.competitor_runs.contains_key(&instance_id) {
                    session.store.update(
                        &instance_id,
                        InstanceUpdate::new().loading_for(AnalysisKind::Competitor, false),
                    );
                    self.persist(&session)?;
                }
                return Ok(AnalyzeOutcome::Discarded { instance_id });
            }
            session.competitor_runs.remove(&instance_id);
        }

        let done = InstanceUpdate::new().loading_for(kind, false);
        let (update, outcome) = match result {
            Ok(issues) => {
                let issue_count = issues.len();
                let mut update = done.error_for(kind, None).issues_for(kind, issues);
                if kind == AnalysisKind::Primary {
                    update = update.last_scan(Some(now));
                }
                let outcome = Ok(AnalyzeOutcome::Completed {
                    instance_id: instance_id.clone(),
                    issue_count,
                });
                (update, outcome)
            }
            Err(e) => {
                let update = done.error_for(kind, Some(e.to_string()));
                // Primary results are cleared on failure unless the response
                // was merely malformed; competitor results always survive.
                let update = match (kind, &e) {
                    (AnalysisKind::Primary, SynthesisError::ResponseFormat(_)) => update,
                    (AnalysisKind::Primary, _) => update.issues(Vec::new()).last_scan(None),
                    (AnalysisKind::Competitor, _) => update,
                };
                (update, Err(AnalysisError::from(e)))
            }
        };

        session.store.update(&instance_id, update);
        self.persist(&session)?;
        if let Err(e) = &outcome {
            warn!(instance = %instance_id, %kind, error = %e, "analysis failed");
        }
        outcome
    }

    // --- Issue resolution ---

    /// Remove a primary issue. Returns false if the issue was not present.
    pub fn resolve(&self, instance_id: &InstanceId, issue_id: &IssueId) -> AnalysisResult<bool> {
        self.resolve_issue(instance_id, AnalysisKind::Primary, issue_id)
    }

    /// Remove a competitor issue. Returns false if the issue was not present.
    pub fn resolve_competitor(
        &self,
        instance_id: &InstanceId,
        issue_id: &IssueId,
    ) -> AnalysisResult<bool> {
        self.resolve_issue(instance_id, AnalysisKind::Competitor, issue_id)
    }

    fn resolve_issue(
        &self,
        instance_id: &InstanceId,
        kind: AnalysisKind,
        issue_id: &IssueId,
    ) -> AnalysisResult<bool> {
        let mut session = self.lock();
        let instance = session
            .store
            .get(instance_id)
            .ok_or_else(|| AnalysisError::InstanceNotFound(instance_id.clone()))?;

        let current = instance.issues(kind);
        let remaining: Vec<Issue> = current
            .iter()
            .filter(|issue| &issue.id != issue_id)
            .cloned()
            .collect();
        if remaining.len() == current.len() {
            return Ok(false);
        }

        session
            .store
            .update(instance_id, InstanceUpdate::new().issues_for(kind, remaining));
        self.persist(&session)?;
        Ok(true)
    }

    // --- Plan ---

    /// Switch plan. Moving to a paid plan clears the free-tier counters.
    pub fn set_plan(&self, plan: PlanTier) -> AnalysisResult<()> {
        let mut session = self.lock();
        session.store.set_plan(plan);
        if !plan.is_free() {
            session.quota = QuotaState::new();
        }
        info!(%plan, "plan changed");
        self.persist(&session)
    }

    /// Payment confirmed for the current plan: refresh scan schedules.
    pub fn complete_payment(&self) -> AnalysisResult<()> {
        let mut session = self.lock();
        session.store.recompute_schedules();
        self.persist(&session)
    }

    // --- Session ---

    /// Show a fresh draft in place of the active instance.
    pub fn new_investigation(&self) -> AnalysisResult<InstanceId> {
        let mut session = self.lock();
        let id = session.store.create_draft();
        self.persist(&session)?;
        Ok(id)
    }

    /// Activate a registered instance. Unknown ids are ignored.
    pub fn select(&self, instance_id: &InstanceId) -> AnalysisResult<bool> {
        let mut session = self.lock();
        if !session.store.select(instance_id) {
            return Ok(false);
        }
        self.persist(&session)?;
        Ok(true)
    }

    /// Delete an instance. Unknown ids change nothing and return `None`.
    pub fn delete(&self, instance_id: &InstanceId) -> AnalysisResult<Option<Instance>> {
        let mut session = self.lock();
        session.invalidate_competitor(instance_id);
        let removed = session.store.delete(instance_id);
        if removed.is_some() {
            self.persist(&session)?;
        }
        Ok(removed)
    }

    /// Blank the active instance, keeping its id; a draft is replaced.
    pub fn reset_active(&self) -> AnalysisResult<()> {
        let mut session = self.lock();
        match session.store.active_id().cloned() {
            Some(id) => {
                session.invalidate_competitor(&id);
                session.store.reset(&id);
            }
            None => {
                session.store.create_draft();
            }
        }
        self.persist(&session)
    }

    /// Drop competitor name, results and error from the active instance.
    ///
    /// A competitor call still in flight keeps its loading flag but its
    /// result will be discarded.
    pub fn clear_competitor(&self) -> AnalysisResult<()> {
        let mut session = self.lock();
        if let Some(id) = session.store.active_id().cloned() {
            session.invalidate_competitor(&id);
        }
        session.update_active(InstanceUpdate::new().clear_competitor());
        self.persist(&session)
    }

    // --- Read ---

    pub fn plan(&self) -> PlanTier {
        self.lock().store.plan()
    }

    pub fn quota(&self) -> QuotaState {
        self.lock().quota
    }

    pub fn active_id(&self) -> Option<InstanceId> {
        self.lock().store.active_id().cloned()
    }

    /// The instance currently shown, draft or registered
    pub fn active(&self) -> Option<Instance> {
        self.lock().store.active().cloned()
    }

    pub fn get(&self, instance_id: &InstanceId) -> Option<Instance> {
        self.lock().store.get(instance_id).cloned()
    }

    /// Consistent view of every registered instance
    pub fn instances(&self) -> Arc<InstanceMap> {
        self.lock().store.instances()
    }

    /// Registered instances in insertion order
    pub fn list(&self) -> Vec<Instance> {
        self.lock().store.list_all().into_iter().cloned().collect()
    }

    /// Everything that would be persisted right now
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }
}
