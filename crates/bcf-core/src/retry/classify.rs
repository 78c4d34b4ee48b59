//! Map a typed fetch error into an attempt outcome.

use crate::fetch::{FetchError, Outcome};
use crate::retry::policy::FailureKind;

/// Classify a failed fetch into an `Outcome`.
///
/// This is the single place where error signatures turn into retry
/// semantics; swapping the ban heuristics means swapping this function,
/// not touching the orchestrator. Unknown signatures come out as
/// `Ambiguous`, which the policy treats as proxy-caused.
pub fn classify_failure(err: &FetchError) -> Outcome {
    match err {
        FetchError::NoCaptions(reason) => Outcome::NoResource {
            reason: reason.clone(),
        },
        FetchError::Gone(reason) => Outcome::Fatal {
            reason: reason.clone(),
        },
        FetchError::Timeout => Outcome::Retryable(FailureKind::Timeout),
        FetchError::Network(_) => Outcome::Retryable(FailureKind::Network),
        FetchError::RateLimited => Outcome::ProxyBanned(FailureKind::RateLimited),
        FetchError::Blocked => Outcome::ProxyBanned(FailureKind::Blocked),
        FetchError::UpstreamStatus(code) => classify_status(*code),
        FetchError::Other(_) => Outcome::ProxyBanned(FailureKind::Ambiguous),
    }
}

/// Classify an unmapped HTTP status. 429/403 are ban signatures even when
/// the client did not map them itself; 5xx is the server's problem, not
/// the proxy's.
fn classify_status(code: u32) -> Outcome {
    match code {
        429 => Outcome::ProxyBanned(FailureKind::RateLimited),
        403 => Outcome::ProxyBanned(FailureKind::Blocked),
        500..=599 => Outcome::Retryable(FailureKind::Network),
        _ => Outcome::ProxyBanned(FailureKind::Ambiguous),
    }
}
