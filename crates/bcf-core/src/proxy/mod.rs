//! Proxy pool: per-proxy health state and selection for every fetch attempt.
//!
//! The pool is the single authority on which egress identities are still
//! usable. Workers select from it before each attempt and push ban
//! observations back into it; bans are permanent for the run.

mod pool;
mod record;

pub use pool::{ProxyPool, ProxySources};
pub use record::{FailureEvent, ProxyOrigin, ProxyRecord, ProxyStatus};

#[cfg(test)]
mod tests;
