//! Cycle state tracking
//!
//! Tracks per-cycle outcomes and holds the per-list advisory locks that
//! serialize overlapping cycles against the same `(workspace, list)` pair.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Retained cycle summaries: one day's worth at the default five-minute
/// cadence. Older summaries are discarded.
pub const CYCLE_HISTORY_LIMIT: usize = 288;

/// Outcome of one planning cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: u32,
    pub workspaces_attempted: u32,
    pub workspaces_succeeded: u32,
    pub campaigns_processed: u32,
    pub leads_injected: u64,
    pub duration_seconds: f64,
    pub timestamp: String,
}

/// Mutable injector state shared across cycles.
pub struct InjectorState {
    cycles_run: u32,
    total_leads_injected: u64,
    cycle_history: Vec<CycleSummary>,

    /// Advisory locks keyed by `(workspace_id, list_number)`. Overlapping
    /// cycles must hold the lock across the fetch + transition + enqueue
    /// sequence for a list, or they can double-select the same lead.
    list_locks: HashMap<(String, String), Arc<Mutex<()>>>,
}

impl Default for InjectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectorState {
    pub fn new() -> Self {
        Self {
            cycles_run: 0,
            total_leads_injected: 0,
            cycle_history: Vec::new(),
            list_locks: HashMap::new(),
        }
    }

    /// Next cycle ordinal (1-based).
    pub fn next_cycle(&self) -> u32 {
        self.cycles_run + 1
    }

    pub fn record_cycle(&mut self, summary: CycleSummary) {
        self.cycles_run += 1;
        self.total_leads_injected += summary.leads_injected;
        self.cycle_history.push(summary);
        if self.cycle_history.len() > CYCLE_HISTORY_LIMIT {
            self.cycle_history.remove(0);
        }
    }

    pub fn cycles_run(&self) -> u32 {
        self.cycles_run
    }

    pub fn total_leads_injected(&self) -> u64 {
        self.total_leads_injected
    }

    pub fn cycle_history(&self) -> &[CycleSummary] {
        &self.cycle_history
    }

    /// Advisory lock for one `(workspace, list)` pair, created on first use.
    pub fn list_lock(&mut self, workspace_id: &str, list_number: &str) -> Arc<Mutex<()>> {
        self.list_locks
            .entry((workspace_id.to_string(), list_number.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(cycle: u32, injected: u64) -> CycleSummary {
        CycleSummary {
            cycle,
            workspaces_attempted: 2,
            workspaces_succeeded: 2,
            campaigns_processed: 3,
            leads_injected: injected,
            duration_seconds: 0.1,
            timestamp: shared::logging::format_timestamp(),
        }
    }

    #[test]
    fn records_cycles_and_totals() {
        let mut state = InjectorState::new();
        assert_eq!(state.next_cycle(), 1);

        state.record_cycle(summary(1, 40));
        state.record_cycle(summary(2, 2));

        assert_eq!(state.cycles_run(), 2);
        assert_eq!(state.total_leads_injected(), 42);
        assert_eq!(state.cycle_history().len(), 2);
        assert_eq!(state.next_cycle(), 3);
    }

    #[test]
    fn history_is_bounded_while_totals_keep_counting() {
        let mut state = InjectorState::new();
        for cycle in 1..=(CYCLE_HISTORY_LIMIT as u32 + 10) {
            state.record_cycle(summary(cycle, 1));
        }

        assert_eq!(state.cycle_history().len(), CYCLE_HISTORY_LIMIT);
        // Oldest summaries are dropped first.
        assert_eq!(state.cycle_history()[0].cycle, 11);
        assert_eq!(state.cycles_run(), CYCLE_HISTORY_LIMIT as u32 + 10);
        assert_eq!(
            state.total_leads_injected(),
            CYCLE_HISTORY_LIMIT as u64 + 10
        );
    }

    #[test]
    fn list_lock_is_shared_per_pair() {
        let mut state = InjectorState::new();

        let first = state.list_lock("ws-1", "list-a");
        let again = state.list_lock("ws-1", "list-a");
        let other = state.list_lock("ws-1", "list-b");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
