//! Run report: the exactly-once partition of every item into its terminal
//! bucket, assembled by workers and read only after the run completes.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::fetch::CaptionPayload;

/// Terminal bucket for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Succeeded,
    NoResource,
    Failed,
    ProxyFailed,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Succeeded => "ok",
            Category::NoResource => "no-captions",
            Category::Failed => "failed",
            Category::ProxyFailed => "proxy-failed",
        }
    }
}

/// Terminal record for one item.
#[derive(Debug)]
pub struct ItemRecord {
    pub id: String,
    /// Attempts consumed before resolution (0 for items drained unattempted).
    pub attempts: u32,
    /// Human-readable cause; empty for successes.
    pub detail: String,
    /// Present only for succeeded items.
    pub payload: Option<CaptionPayload>,
}

/// Final partition of a run, plus the proxy ledger at completion.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<ItemRecord>,
    pub no_resource: Vec<ItemRecord>,
    pub failed: Vec<ItemRecord>,
    pub proxy_failed: Vec<ItemRecord>,
    /// Sorted addresses banned during the run.
    pub banned_proxies: Vec<String>,
    /// Insertion-ordered addresses still active at completion.
    pub active_proxies: Vec<String>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.no_resource.len() + self.failed.len() + self.proxy_failed.len()
    }

    /// True when nothing ended in `failed` or `proxy_failed`.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.proxy_failed.is_empty()
    }
}

struct CollectorState {
    report: RunReport,
    seen: HashSet<String>,
}

/// Sole mutator of the run report.
///
/// `record` is the single entry point; it de-duplicates by id so an item
/// can never land in two buckets no matter which worker or attempt
/// resolved it. A duplicate record is a programming error, surfaced via
/// `debug_assert!` and an error log, never a silent overwrite.
pub struct ResultCollector {
    state: Mutex<CollectorState>,
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState {
                report: RunReport::default(),
                seen: HashSet::new(),
            }),
        }
    }

    /// Record one item's terminal outcome.
    pub fn record(&self, category: Category, record: ItemRecord) {
        let mut state = self.state.lock().unwrap();
        if !state.seen.insert(record.id.clone()) {
            debug_assert!(false, "duplicate terminal record for {}", record.id);
            tracing::error!(id = %record.id, category = category.as_str(),
                "duplicate terminal record dropped");
            return;
        }
        tracing::debug!(id = %record.id, category = category.as_str(),
            attempts = record.attempts, "item resolved");
        match category {
            Category::Succeeded => state.report.succeeded.push(record),
            Category::NoResource => state.report.no_resource.push(record),
            Category::Failed => state.report.failed.push(record),
            Category::ProxyFailed => state.report.proxy_failed.push(record),
        }
    }

    /// Seal the report with the proxy ledger and hand it out. Call once,
    /// after all workers have stopped.
    pub fn finish(&self, banned_proxies: Vec<String>, active_proxies: Vec<String>) -> RunReport {
        let mut state = self.state.lock().unwrap();
        let mut report = std::mem::take(&mut state.report);
        report.banned_proxies = banned_proxies;
        report.active_proxies = active_proxies;
        report
    }
}
