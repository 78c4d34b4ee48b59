//! Pool state, selection and ban transitions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::error::ConfigError;

use super::record::{FailureEvent, ProxyOrigin, ProxyRecord, ProxyStatus};

/// Proxy addresses by origin, already normalized by the caller.
#[derive(Debug, Clone, Default)]
pub struct ProxySources {
    pub user: Vec<String>,
    pub file: Vec<String>,
    pub public: Vec<String>,
}

/// Health state for every known proxy, plus selection for each attempt.
///
/// One mutex guards the whole record set, which makes `mark_banned` atomic
/// with respect to `select`: once a ban completes, no later select can
/// return that record. `select` and `mark_used` are separate acquisitions;
/// two workers may select the same proxy before either marks it used,
/// which only skews usage-count fairness, never correctness.
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
    allow_direct: bool,
}

#[derive(Debug)]
struct PoolState {
    records: Vec<ProxyRecord>,
    index: HashMap<String, usize>,
}

impl ProxyPool {
    /// Builds the deduplicated record set. User- and file-supplied
    /// addresses take precedence over public-pool ones on collision.
    /// Fails only when the pool comes up empty and `allow_direct` is off.
    pub fn build(sources: ProxySources, allow_direct: bool) -> Result<Self, ConfigError> {
        let mut records: Vec<ProxyRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let groups = [
            (sources.user, ProxyOrigin::UserSupplied),
            (sources.file, ProxyOrigin::FileSupplied),
            (sources.public, ProxyOrigin::PublicPool),
        ];
        for (addresses, origin) in groups {
            for address in addresses {
                let address = address.trim().to_string();
                if address.is_empty() {
                    continue;
                }
                if index.contains_key(&address) {
                    tracing::debug!(proxy = %address, "duplicate proxy address skipped");
                    continue;
                }
                index.insert(address.clone(), records.len());
                records.push(ProxyRecord::new(address, origin));
            }
        }
        if records.is_empty() && !allow_direct {
            return Err(ConfigError::NoActiveProxies);
        }
        tracing::info!(
            proxies = records.len(),
            allow_direct,
            "proxy pool initialized"
        );
        Ok(Self {
            state: Mutex::new(PoolState { records, index }),
            allow_direct,
        })
    }

    /// Whether callers may fall back to a direct attempt when no active
    /// proxy is available.
    pub fn direct_allowed(&self) -> bool {
        self.allow_direct
    }

    /// Address of the least-recently-used active record; ties broken by
    /// lowest usage count, then insertion order. Never-used records sort
    /// before any used one. `None` when the active set is empty.
    pub fn select(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        let picked = state
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == ProxyStatus::Active)
            .min_by_key(|(idx, r)| (r.last_used_at, r.usage_count, *idx))
            .map(|(_, r)| r.address.clone());
        if let Some(address) = &picked {
            tracing::trace!(proxy = %address, "proxy selected");
        }
        picked
    }

    /// Records a selection: bumps the usage count and recency stamp.
    /// Returns true the first time an address is used in this run.
    pub fn mark_used(&self, address: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(&idx) = state.index.get(address) else {
            return false;
        };
        let record = &mut state.records[idx];
        let first_use = record.usage_count == 0;
        record.usage_count += 1;
        record.last_used_at = Some(Instant::now());
        first_use
    }

    /// Bans a proxy. Appends to its failure log on every call; the status
    /// transition out of `Active` happens at most once, and the return
    /// value reports whether this call was it.
    pub fn mark_banned(&self, address: &str, reason: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(&idx) = state.index.get(address) else {
            tracing::debug!(proxy = %address, "ban requested for unknown address");
            return false;
        };
        let record = &mut state.records[idx];
        record.failure_log.push(FailureEvent {
            reason: reason.to_string(),
            at: Instant::now(),
        });
        if record.status == ProxyStatus::Banned {
            tracing::debug!(proxy = %address, reason, "proxy already banned, logged again");
            return false;
        }
        record.status = ProxyStatus::Banned;
        tracing::warn!(proxy = %address, reason, "proxy banned");
        true
    }

    /// Insertion-ordered addresses of still-active records.
    pub fn snapshot_active(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|r| r.status == ProxyStatus::Active)
            .map(|r| r.address.clone())
            .collect()
    }

    /// Sorted addresses of banned records.
    pub fn banned(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut out: Vec<String> = state
            .records
            .iter()
            .filter(|r| r.status == ProxyStatus::Banned)
            .map(|r| r.address.clone())
            .collect();
        out.sort();
        out
    }

    pub fn active_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|r| r.status == ProxyStatus::Active)
            .count()
    }

    /// Clone of one record, for inspection and tests.
    pub fn record(&self, address: &str) -> Option<ProxyRecord> {
        let state = self.state.lock().unwrap();
        state
            .index
            .get(address)
            .map(|&idx| state.records[idx].clone())
    }
}
