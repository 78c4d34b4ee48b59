//! Per-proxy record types.

use std::time::Instant;

/// Where a proxy address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOrigin {
    UserSupplied,
    FileSupplied,
    PublicPool,
}

/// Health of a proxy within one run. Banned is terminal; there is no
/// automatic un-banning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Active,
    Banned,
}

/// One entry in a proxy's failure log.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub reason: String,
    pub at: Instant,
}

/// Per-proxy observations for one run.
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    /// Normalized address, unique within the pool (e.g. `http://1.2.3.4:8080`).
    pub address: String,
    pub origin: ProxyOrigin,
    pub status: ProxyStatus,
    /// Times this proxy was selected for an attempt, whatever the outcome.
    pub usage_count: u64,
    pub last_used_at: Option<Instant>,
    /// Append-only; grows on every ban request, including re-bans.
    pub failure_log: Vec<FailureEvent>,
}

impl ProxyRecord {
    pub(super) fn new(address: String, origin: ProxyOrigin) -> Self {
        Self {
            address,
            origin,
            status: ProxyStatus::Active,
            usage_count: 0,
            last_used_at: None,
            failure_log: Vec::new(),
        }
    }
}
