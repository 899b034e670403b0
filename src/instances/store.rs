//! InstanceStore: the registered investigations plus the active slot

use crate::model::{sort_by_occurrences, Instance, InstanceId, InstanceUpdate, PlanTier};
use crate::schedule::compute_next_due;
use crate::storage::Snapshot;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registered instances keyed by id, in insertion order
pub type InstanceMap = IndexMap<InstanceId, Instance>;

/// What the user is currently looking at.
///
/// Either an unregistered draft that owns its data, or a pointer at a
/// registered instance. Holding both at once is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
enum ActiveSlot {
    Draft(Instance),
    Registered(InstanceId),
}

/// Owns every investigation and the active selection.
///
/// The map is copy-on-write: each mutation builds a new map and swaps it in
/// whole, so a snapshot handed out by [`InstanceStore::instances`] never
/// observes a half-applied change.
#[derive(Debug, Clone)]
pub struct InstanceStore {
    instances: Arc<InstanceMap>,
    active: ActiveSlot,
    plan: PlanTier,
}

impl InstanceStore {
    /// An empty store holding a fresh draft
    pub fn new(plan: PlanTier) -> Self {
        Self {
            instances: Arc::new(InstanceMap::new()),
            active: ActiveSlot::Draft(Instance::new()),
            plan,
        }
    }

    /// Rebuild a store from persisted state.
    ///
    /// Issues are re-sorted, `next_scan_due` recomputed for `plan` and
    /// in-flight flags cleared, since nothing can be loading across sessions.
    /// An active id that no longer resolves falls back to the first instance;
    /// an empty map yields a fresh draft.
    pub fn restore(snapshot: &Snapshot, plan: PlanTier) -> Self {
        let mut instances = InstanceMap::with_capacity(snapshot.instances.len());
        for (id, stored) in &snapshot.instances {
            let mut instance = stored.clone();
            instance.id = id.clone();
            instance.is_loading = false;
            instance.is_competitor_loading = false;
            normalize(&mut instance, plan);
            instances.insert(id.clone(), instance);
        }

        let active = match &snapshot.active_instance_id {
            Some(id) if instances.contains_key(id) => ActiveSlot::Registered(id.clone()),
            _ => match instances.keys().next() {
                Some(first) => ActiveSlot::Registered(first.clone()),
                None => ActiveSlot::Draft(Instance::new()),
            },
        };

        Self {
            instances: Arc::new(instances),
            active,
            plan,
        }
    }

    pub fn plan(&self) -> PlanTier {
        self.plan
    }

    /// Switch plan and recompute every instance's `next_scan_due`.
    pub fn set_plan(&mut self, plan: PlanTier) {
        self.plan = plan;
        self.recompute_schedules();
    }

    /// Recompute `next_scan_due` for every instance under the current plan.
    pub fn recompute_schedules(&mut self) {
        let plan = self.plan;
        self.commit(|map| {
            for instance in map.values_mut() {
                instance.next_scan_due = compute_next_due(plan, instance.last_scan_timestamp);
            }
        });
    }

    /// Consistent read-only view of all registered instances.
    pub fn instances(&self) -> Arc<InstanceMap> {
        Arc::clone(&self.instances)
    }

    /// Registered instances in insertion order
    pub fn list_all(&self) -> Vec<&Instance> {
        self.instances.values().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    /// Id of the active registered instance, `None` while a draft is shown
    pub fn active_id(&self) -> Option<&InstanceId> {
        match &self.active {
            ActiveSlot::Registered(id) => Some(id),
            ActiveSlot::Draft(_) => None,
        }
    }

    pub fn draft(&self) -> Option<&Instance> {
        match &self.active {
            ActiveSlot::Draft(draft) => Some(draft),
            ActiveSlot::Registered(_) => None,
        }
    }

    /// The instance currently shown, draft or registered.
    pub fn active(&self) -> Option<&Instance> {
        match &self.active {
            ActiveSlot::Draft(draft) => Some(draft),
            ActiveSlot::Registered(id) => self.instances.get(id),
        }
    }

    /// Replace the active slot with a fresh draft and return its id.
    pub fn create_draft(&mut self) -> InstanceId {
        let draft = Instance::new();
        let id = draft.id.clone();
        self.active = ActiveSlot::Draft(draft);
        id
    }

    /// Move the draft into the map under its own id, apply `update`, and make
    /// it active. Returns the committed record, or `None` if no draft exists.
    pub fn register_draft(&mut self, update: InstanceUpdate) -> Option<Instance> {
        let ActiveSlot::Draft(draft) = &self.active else {
            return None;
        };
        let mut instance = draft.clone();
        update.apply_to(&mut instance);
        normalize(&mut instance, self.plan);

        let id = instance.id.clone();
        let committed = instance.clone();
        self.commit(|map| {
            map.insert(id.clone(), instance);
        });
        self.active = ActiveSlot::Registered(id);
        Some(committed)
    }

    /// Apply a partial update to a registered instance.
    ///
    /// Replaced issue lists are re-sorted and a changed `last_scan_timestamp`
    /// recomputes `next_scan_due`. Returns false if `id` is unknown.
    pub fn update(&mut self, id: &InstanceId, update: InstanceUpdate) -> bool {
        if !self.instances.contains_key(id) {
            return false;
        }
        let plan = self.plan;
        self.commit(|map| {
            if let Some(instance) = map.get_mut(id) {
                apply(instance, update, plan);
            }
        });
        true
    }

    /// Apply a partial update to the draft. Returns false if there is none.
    pub fn update_draft(&mut self, update: InstanceUpdate) -> bool {
        let plan = self.plan;
        match &mut self.active {
            ActiveSlot::Draft(draft) => {
                apply(draft, update, plan);
                true
            }
            ActiveSlot::Registered(_) => false,
        }
    }

    /// Replace a registered instance with a blank record under the same id.
    pub fn reset(&mut self, id: &InstanceId) -> bool {
        if !self.instances.contains_key(id) {
            return false;
        }
        self.commit(|map| {
            if let Some(instance) = map.get_mut(id) {
                *instance = Instance::with_id(id.clone());
            }
        });
        true
    }

    /// Make a registered instance active. Unknown ids are ignored.
    pub fn select(&mut self, id: &InstanceId) -> bool {
        if !self.instances.contains_key(id) {
            return false;
        }
        self.active = ActiveSlot::Registered(id.clone());
        true
    }

    /// Remove an instance.
    ///
    /// Deleting the active instance activates the first remaining one, or a
    /// fresh draft if none remain. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &InstanceId) -> Option<Instance> {
        if !self.instances.contains_key(id) {
            return None;
        }
        let mut removed = None;
        self.commit(|map| {
            removed = map.shift_remove(id);
        });

        if self.active_id() == Some(id) {
            self.active = match self.instances.keys().next() {
                Some(first) => ActiveSlot::Registered(first.clone()),
                None => ActiveSlot::Draft(Instance::new()),
            };
        }
        removed
    }

    /// Persistable view of the store. Drafts are not persisted.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            instances: (*self.instances).clone(),
            active_instance_id: self.active_id().cloned(),
            plan: self.plan,
            ..Snapshot::default()
        }
    }

    fn commit(&mut self, mutate: impl FnOnce(&mut InstanceMap)) {
        let mut next = (*self.instances).clone();
        mutate(&mut next);
        self.instances = Arc::new(next);
    }
}

fn apply(instance: &mut Instance, update: InstanceUpdate, plan: PlanTier) {
    let resort_primary = update.issues.is_some();
    let resort_competitor = update.competitor_issues.is_some();
    let scan_changed = update.apply_to(instance);

    if resort_primary {
        sort_by_occurrences(&mut instance.issues);
    }
    if resort_competitor {
        sort_by_occurrences(&mut instance.competitor_issues);
    }
    if scan_changed {
        instance.next_scan_due = compute_next_due(plan, instance.last_scan_timestamp);
    }
}

fn normalize(instance: &mut Instance, plan: PlanTier) {
    sort_by_occurrences(&mut instance.issues);
    sort_by_occurrences(&mut instance.competitor_issues);
    instance.next_scan_due = compute_next_due(plan, instance.last_scan_timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Issue, IssueCategory, IssueId, SourceType};
    use chrono::{Duration, TimeZone, Utc};

    fn issue(total: u32) -> Issue {
        Issue::new(
            IssueId::new(),
            format!("issue with {} mentions", total),
            IssueCategory::Bug,
            Vec::new(),
            [(SourceType::Tweets, total)].into_iter().collect(),
            Utc::now(),
        )
    }

    fn registered(store: &mut InstanceStore, name: &str) -> InstanceId {
        store.create_draft();
        store
            .register_draft(InstanceUpdate::new().product_name(name))
            .unwrap()
            .id
    }

    /// Exactly one of active id and draft is present.
    fn assert_slot_invariant(store: &InstanceStore) {
        assert!(store.active_id().is_some() ^ store.draft().is_some());
        if let Some(id) = store.active_id() {
            assert!(store.contains(id));
        }
    }

    #[test]
    fn new_store_holds_only_a_draft() {
        let store = InstanceStore::new(PlanTier::Free);
        assert!(store.is_empty());
        assert!(store.draft().is_some());
        assert_slot_invariant(&store);
    }

    #[test]
    fn register_draft_moves_it_into_the_map() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let draft_id = store.draft().unwrap().id.clone();

        let committed = store
            .register_draft(InstanceUpdate::new().product_name("Acme").loading(true))
            .unwrap();

        assert_eq!(committed.id, draft_id);
        assert_eq!(store.active_id(), Some(&draft_id));
        assert!(store.draft().is_none());
        assert_eq!(store.get(&draft_id).unwrap().product_name, "Acme");
        assert!(store.get(&draft_id).unwrap().is_loading);
        assert_slot_invariant(&store);
    }

    #[test]
    fn register_without_draft_is_refused() {
        let mut store = InstanceStore::new(PlanTier::Free);
        registered(&mut store, "Acme");
        assert!(store.register_draft(InstanceUpdate::new()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_resorts_replaced_issue_lists() {
        let mut store = InstanceStore::new(PlanTier::Max);
        let id = registered(&mut store, "Acme");

        store.update(
            &id,
            InstanceUpdate::new()
                .issues(vec![issue(5), issue(900), issue(40)])
                .competitor_issues(vec![issue(1), issue(2)]),
        );

        let instance = store.get(&id).unwrap();
        let totals: Vec<u64> = instance.issues.iter().map(|i| i.total_occurrences()).collect();
        assert_eq!(totals, vec![900, 40, 5]);
        assert_eq!(instance.competitor_issues[0].total_occurrences(), 2);
    }

    #[test]
    fn update_recomputes_next_scan_when_last_scan_changes() {
        let mut store = InstanceStore::new(PlanTier::Pro);
        let id = registered(&mut store, "Acme");
        let scanned = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        store.update(&id, InstanceUpdate::new().last_scan(Some(scanned)));
        assert_eq!(store.get(&id).unwrap().next_scan_due, Some(scanned + Duration::weeks(1)));

        store.update(&id, InstanceUpdate::new().last_scan(None));
        assert_eq!(store.get(&id).unwrap().next_scan_due, None);
    }

    #[test]
    fn update_unknown_id_returns_false() {
        let mut store = InstanceStore::new(PlanTier::Free);
        assert!(!store.update(&InstanceId::from("missing"), InstanceUpdate::new().loading(true)));
    }

    #[test]
    fn set_plan_recomputes_every_schedule() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let id = registered(&mut store, "Acme");
        let scanned = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.update(&id, InstanceUpdate::new().last_scan(Some(scanned)));
        assert_eq!(store.get(&id).unwrap().next_scan_due, None);

        store.set_plan(PlanTier::Max);
        assert_eq!(store.get(&id).unwrap().next_scan_due, Some(scanned + Duration::weeks(1)));

        store.set_plan(PlanTier::Free);
        assert_eq!(store.get(&id).unwrap().next_scan_due, None);
    }

    #[test]
    fn delete_active_falls_back_to_first_remaining() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let first = registered(&mut store, "First");
        let second = registered(&mut store, "Second");
        let third = registered(&mut store, "Third");
        assert_eq!(store.active_id(), Some(&third));

        store.delete(&third);
        assert_eq!(store.active_id(), Some(&first));
        assert_slot_invariant(&store);

        store.select(&second);
        store.delete(&first);
        assert_eq!(store.active_id(), Some(&second), "deleting inactive keeps selection");
    }

    #[test]
    fn delete_last_instance_creates_draft() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let id = registered(&mut store, "Only");

        let removed = store.delete(&id).unwrap();
        assert_eq!(removed.product_name, "Only");
        assert!(store.is_empty());
        assert!(store.draft().is_some());
        assert_slot_invariant(&store);
    }

    #[test]
    fn delete_unknown_id_changes_nothing() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let id = registered(&mut store, "Acme");
        let before = store.instances();

        assert!(store.delete(&InstanceId::from("ghost")).is_none());
        assert_eq!(*store.instances(), *before);
        assert_eq!(store.active_id(), Some(&id));
        assert!(store.draft().is_none());
    }

    #[test]
    fn delete_unknown_id_keeps_draft() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let draft_id = store.draft().unwrap().id.clone();
        store.delete(&InstanceId::from("ghost"));
        assert_eq!(store.draft().unwrap().id, draft_id);
    }

    #[test]
    fn select_unknown_id_is_ignored() {
        let mut store = InstanceStore::new(PlanTier::Free);
        assert!(!store.select(&InstanceId::from("ghost")));
        assert!(store.draft().is_some());
    }

    #[test]
    fn snapshot_held_by_reader_is_unaffected_by_later_writes() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let id = registered(&mut store, "Acme");
        let view = store.instances();

        store.update(&id, InstanceUpdate::new().product_name("Renamed"));
        assert_eq!(view.get(&id).unwrap().product_name, "Acme");
        assert_eq!(store.get(&id).unwrap().product_name, "Renamed");
    }

    #[test]
    fn reset_keeps_id_and_clears_data() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let id = registered(&mut store, "Acme");
        store.update(&id, InstanceUpdate::new().issues(vec![issue(3)]).has_searched(true));

        assert!(store.reset(&id));
        let instance = store.get(&id).unwrap();
        assert!(instance.product_name.is_empty());
        assert!(instance.issues.is_empty());
        assert!(!instance.has_searched);
    }

    #[test]
    fn restore_falls_back_when_active_id_is_stale() {
        let mut store = InstanceStore::new(PlanTier::Free);
        let first = registered(&mut store, "First");
        registered(&mut store, "Second");
        let mut snapshot = store.to_snapshot();
        snapshot.active_instance_id = Some(InstanceId::from("gone"));

        let restored = InstanceStore::restore(&snapshot, PlanTier::Free);
        assert_eq!(restored.active_id(), Some(&first));
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn restore_clears_loading_and_resorts() {
        let mut store = InstanceStore::new(PlanTier::Pro);
        let id = registered(&mut store, "Acme");
        let mut snapshot = store.to_snapshot();
        {
            let stored = snapshot.instances.get_mut(&id).unwrap();
            stored.is_loading = true;
            stored.issues = vec![issue(1), issue(50)];
            stored.last_scan_timestamp = Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
            stored.next_scan_due = None;
        }

        let restored = InstanceStore::restore(&snapshot, PlanTier::Pro);
        let instance = restored.get(&id).unwrap();
        assert!(!instance.is_loading);
        assert_eq!(instance.issues[0].total_occurrences(), 50);
        assert!(instance.next_scan_due.is_some());
    }

    #[test]
    fn restore_empty_snapshot_yields_draft() {
        let restored = InstanceStore::restore(&Snapshot::default(), PlanTier::Free);
        assert!(restored.draft().is_some());
        assert_slot_invariant(&restored);
    }
}
