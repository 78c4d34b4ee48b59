//! Live run status: cheap-to-read counters published to an external
//! display without ever blocking workers.
//!
//! Consumers either poll `snapshot()` or receive pushed copies over an
//! mpsc channel; pushes use `try_send`, so a slow display drops frames
//! instead of slowing the run down.

use std::sync::Mutex;

use crate::report::Category;

/// Read-only copy of the current run state. Plain owned data.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    /// Items the run was started with.
    pub total: u64,
    /// Workers currently processing an item.
    pub active_jobs: u32,
    /// Items terminally resolved so far. Monotonically non-decreasing.
    pub completed: u64,
    pub succeeded: u64,
    pub no_resource: u64,
    pub failed: u64,
    pub proxy_failed: u64,
    /// Proxies banned so far.
    pub banned_proxies: u64,
    /// Proxies selected at least once.
    pub proxies_used: u64,
    /// Addresses currently active, insertion-ordered.
    pub active_proxies: Vec<String>,
}

impl StatusSnapshot {
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}

/// Thread-safe counter set behind the snapshot.
pub struct StatusAggregator {
    state: Mutex<StatusSnapshot>,
    tx: Option<tokio::sync::mpsc::Sender<StatusSnapshot>>,
}

impl StatusAggregator {
    /// With `tx`, every state change pushes a fresh snapshot (best effort).
    pub fn new(tx: Option<tokio::sync::mpsc::Sender<StatusSnapshot>>) -> Self {
        Self {
            state: Mutex::new(StatusSnapshot::default()),
            tx,
        }
    }

    pub fn set_total(&self, total: u64) {
        self.update(|s| s.total = total);
    }

    pub fn set_active_proxies(&self, addresses: Vec<String>) {
        self.update(|s| s.active_proxies = addresses);
    }

    pub fn attempt_started(&self) {
        self.update(|s| s.active_jobs += 1);
    }

    pub fn attempt_finished(&self) {
        self.update(|s| s.active_jobs = s.active_jobs.saturating_sub(1));
    }

    /// One item reached a terminal bucket.
    pub fn item_resolved(&self, category: Category) {
        self.update(|s| {
            s.completed += 1;
            match category {
                Category::Succeeded => s.succeeded += 1,
                Category::NoResource => s.no_resource += 1,
                Category::Failed => s.failed += 1,
                Category::ProxyFailed => s.proxy_failed += 1,
            }
        });
    }

    /// A proxy transitioned to banned; `active` is the pool's new active set.
    pub fn proxy_banned(&self, active: Vec<String>) {
        self.update(|s| {
            s.banned_proxies += 1;
            s.active_proxies = active;
        });
    }

    /// A proxy was selected for the first time this run.
    pub fn proxy_first_used(&self) {
        self.update(|s| s.proxies_used += 1);
    }

    /// Current state, copied out.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.lock().unwrap().clone()
    }

    fn update(&self, mutate: impl FnOnce(&mut StatusSnapshot)) {
        let mut state = self.state.lock().unwrap();
        mutate(&mut state);
        if let Some(tx) = &self.tx {
            // Sent under the lock so frames arrive in state order; try_send
            // never blocks, and dropped frames are superseded by the next one.
            let _ = tx.try_send(state.clone());
        }
    }
}
