//! Retry and rotation policy.
//!
//! This module encapsulates failure classification (timeouts, throttling,
//! ban signatures) and the backoff/rotation decisions so the orchestrator
//! can stay a plain state machine over clean enums.

mod classify;
mod policy;

pub use classify::classify_failure;
pub use policy::{FailureKind, GiveUpCause, RetryDecision, RetryPolicy};
