//! Owned per-tab state store.
//!
//! One record per live tab. The map lock is held only long enough to find or
//! insert a record; each record has its own mutex so updates for one tab are
//! serialized while other tabs proceed independently. Readers always get a
//! cloned snapshot of a fully applied update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::state::{MemorySource, TabId, TabState};

/// Identifies the update cycle an enrichment result belongs to.
///
/// `epoch` changes whenever the tab's record is replaced (navigation);
/// `cycle` advances with every activity report on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentTicket {
    pub epoch: u64,
    pub cycle: u64,
}

/// A resolved enrichment value, tagged with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentReading {
    pub source: MemorySource,
    pub memory_mb: f64,
    /// Only the process-level tier supplies an authoritative CPU figure.
    pub cpu_percent: Option<f64>,
}

impl EnrichmentReading {
    pub fn memory(source: MemorySource, memory_mb: f64) -> Self {
        Self {
            source,
            memory_mb,
            cpu_percent: None,
        }
    }
}

/// A tab's state plus the bookkeeping that orders enrichment results.
#[derive(Debug)]
pub struct TabRecord {
    state: TabState,
    epoch: u64,
    cycle: u64,
    applied: Option<(u64, MemorySource)>,
}

impl TabRecord {
    fn new(epoch: u64, site: Option<String>) -> Self {
        let mut state = TabState::new();
        state.site = site;
        Self {
            state,
            epoch,
            cycle: 0,
            applied: None,
        }
    }

    pub fn state_mut(&mut self) -> &mut TabState {
        &mut self.state
    }

    /// Open a new update cycle and return the ticket for its enrichment.
    pub fn begin_cycle(&mut self) -> EnrichmentTicket {
        self.cycle += 1;
        EnrichmentTicket {
            epoch: self.epoch,
            cycle: self.cycle,
        }
    }

    /// Apply an enrichment result if it is still relevant.
    ///
    /// Rejected when it belongs to a previous page, to an older cycle than one
    /// already applied, or to a lower tier than one already applied in the same
    /// cycle. A default estimate never replaces an existing figure.
    pub fn apply(&mut self, ticket: EnrichmentTicket, reading: EnrichmentReading) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        if let Some((cycle, tier)) = self.applied {
            if ticket.cycle < cycle || (ticket.cycle == cycle && reading.source < tier) {
                return false;
            }
        }
        self.applied = Some((ticket.cycle, reading.source));

        if reading.source == MemorySource::Fallback && self.state.memory_source.is_some() {
            return false;
        }

        self.state.memory_usage = reading.memory_mb.max(0.0);
        self.state.memory_source = Some(reading.source);
        if let Some(cpu) = reading.cpu_percent {
            self.state.cpu_activity_score = cpu.clamp(0.0, 100.0);
        }
        self.state.refresh();
        true
    }
}

type SharedRecord = Arc<Mutex<TabRecord>>;

/// Store of per-tab records, shared between ingest and readers.
#[derive(Debug, Default)]
pub struct TabStore {
    tabs: RwLock<HashMap<TabId, SharedRecord>>,
    next_epoch: AtomicU64,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the tab's record, creating it if absent, then recompute
    /// the tab's warnings.
    pub fn update<R>(&self, tab: TabId, f: impl FnOnce(&mut TabRecord) -> R) -> R {
        let record = self.get_or_create(tab);
        let mut guard = lock(&record);
        let result = f(&mut *guard);
        guard.state.refresh();
        result
    }

    /// Apply an enrichment result to a live tab. Closed tabs are not recreated.
    pub fn apply_enrichment(
        &self,
        tab: TabId,
        ticket: EnrichmentTicket,
        reading: EnrichmentReading,
    ) -> bool {
        let Some(record) = self.get(tab) else {
            return false;
        };
        let mut guard = lock(&record);
        guard.apply(ticket, reading)
    }

    /// Clone of the tab's current state, or `None` if the tab is unknown.
    pub fn snapshot(&self, tab: TabId) -> Option<TabState> {
        let record = self.get(tab)?;
        let state = lock(&record).state.clone();
        Some(state)
    }

    /// Replace the tab's record with a fresh zero state.
    pub fn reset(&self, tab: TabId, site: Option<String>) {
        let record = Arc::new(Mutex::new(TabRecord::new(self.epoch(), site)));
        self.tabs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab, record);
    }

    /// Drop the tab's record. Returns whether one existed.
    pub fn remove(&self, tab: TabId) -> bool {
        self.tabs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tab)
            .is_some()
    }

    /// Live tab ids in ascending order.
    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn get(&self, tab: TabId) -> Option<SharedRecord> {
        self.read().get(&tab).cloned()
    }

    fn get_or_create(&self, tab: TabId) -> SharedRecord {
        if let Some(record) = self.get(tab) {
            return record;
        }
        let mut tabs = self.tabs.write().unwrap_or_else(PoisonError::into_inner);
        tabs.entry(tab)
            .or_insert_with(|| Arc::new(Mutex::new(TabRecord::new(self.epoch(), None))))
            .clone()
    }

    fn epoch(&self) -> u64 {
        self.next_epoch.fetch_add(1, Ordering::Relaxed)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TabId, SharedRecord>> {
        self.tabs.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(record: &Mutex<TabRecord>) -> MutexGuard<'_, TabRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAB: TabId = TabId(1);

    fn heap(mb: f64) -> EnrichmentReading {
        EnrichmentReading::memory(MemorySource::PageHeap, mb)
    }

    #[test]
    fn update_creates_lazily_and_refreshes_warnings() {
        let store = TabStore::new();
        assert!(store.snapshot(TAB).is_none());

        store.update(TAB, |record| record.state_mut().wasm_detected = true);

        let state = store.snapshot(TAB).unwrap();
        assert_eq!(state.warnings.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_drops_state() {
        let store = TabStore::new();
        store.update(TAB, |_| ());
        assert!(store.remove(TAB));
        assert!(store.snapshot(TAB).is_none());
        assert!(!store.remove(TAB));
        assert!(store.is_empty());
    }

    #[test]
    fn reset_replaces_with_zero_state() {
        let store = TabStore::new();
        store.update(TAB, |record| {
            let state = record.state_mut();
            state.data_sent = 10;
            state.wasm_detected = true;
        });
        store.reset(TAB, Some("example.com".into()));

        let state = store.snapshot(TAB).unwrap();
        assert_eq!(state.data_sent, 0);
        assert!(!state.wasm_detected);
        assert_eq!(state.site.as_deref(), Some("example.com"));
    }

    #[test]
    fn lower_tier_cannot_overwrite_within_cycle() {
        let store = TabStore::new();
        let ticket = store.update(TAB, TabRecord::begin_cycle);

        assert!(store.apply_enrichment(TAB, ticket, heap(750.0)));
        assert!(!store.apply_enrichment(
            TAB,
            ticket,
            EnrichmentReading::memory(MemorySource::Payload, 200.0)
        ));

        let state = store.snapshot(TAB).unwrap();
        assert_eq!(state.memory_usage, 750.0);
        assert_eq!(state.memory_source, Some(MemorySource::PageHeap));
    }

    #[test]
    fn stale_cycle_is_dropped() {
        let store = TabStore::new();
        let first = store.update(TAB, TabRecord::begin_cycle);
        let second = store.update(TAB, TabRecord::begin_cycle);

        assert!(store.apply_enrichment(TAB, second, heap(300.0)));
        assert!(!store.apply_enrichment(TAB, first, heap(900.0)));
        assert_eq!(store.snapshot(TAB).unwrap().memory_usage, 300.0);
    }

    #[test]
    fn results_from_previous_page_are_dropped() {
        let store = TabStore::new();
        let ticket = store.update(TAB, TabRecord::begin_cycle);
        store.reset(TAB, None);

        assert!(!store.apply_enrichment(TAB, ticket, heap(900.0)));
        assert_eq!(store.snapshot(TAB).unwrap().memory_source, None);
    }

    #[test]
    fn closed_tab_is_not_recreated_by_enrichment() {
        let store = TabStore::new();
        let ticket = store.update(TAB, TabRecord::begin_cycle);
        store.remove(TAB);

        assert!(!store.apply_enrichment(TAB, ticket, heap(900.0)));
        assert!(store.snapshot(TAB).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn fallback_keeps_existing_figure() {
        let store = TabStore::new();
        let first = store.update(TAB, TabRecord::begin_cycle);
        store.apply_enrichment(TAB, first, heap(420.0));

        let second = store.update(TAB, TabRecord::begin_cycle);
        let fallback = EnrichmentReading::memory(MemorySource::Fallback, 150.0);
        assert!(!store.apply_enrichment(TAB, second, fallback));
        assert_eq!(store.snapshot(TAB).unwrap().memory_usage, 420.0);
    }

    #[test]
    fn process_tier_overrides_cpu() {
        let store = TabStore::new();
        let ticket = store.update(TAB, |record| {
            record.state_mut().cpu_activity_score = 20.0;
            record.begin_cycle()
        });
        let reading = EnrichmentReading {
            source: MemorySource::ProcessMetrics,
            memory_mb: 512.0,
            cpu_percent: Some(85.0),
        };
        assert!(store.apply_enrichment(TAB, ticket, reading));

        let state = store.snapshot(TAB).unwrap();
        assert_eq!(state.cpu_activity_score, 85.0);
        assert_eq!(state.warnings.len(), 1);
    }

    #[test]
    fn tabs_are_independent() {
        let store = TabStore::new();
        store.update(TabId(2), |record| record.state_mut().worker_count = 4);
        store.update(TabId(1), |_| ());
        assert_eq!(store.tab_ids(), vec![TabId(1), TabId(2)]);
        assert_eq!(store.snapshot(TabId(1)).unwrap().worker_count, 0);
    }
}
