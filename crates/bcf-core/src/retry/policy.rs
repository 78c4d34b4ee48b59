use std::fmt;
use std::time::Duration;

/// What a failed attempt tells us, for retry purposes.
///
/// This intentionally stays small; clients map transport errors into
/// `FetchError`, and `classify_failure` maps those into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Attempt exceeded its time budget.
    Timeout,
    /// Connection-level failure (reset, DNS, unreachable).
    Network,
    /// Upstream asked us to slow down (429 signature).
    RateLimited,
    /// Upstream refused this egress identity (403 / IP-ban signature).
    Blocked,
    /// Unrecognized signature. Treated as proxy-caused: rotating is safer
    /// than hammering the same endpoint through the same egress.
    Ambiguous,
}

impl FailureKind {
    /// Whether the proxy used for the attempt is the likely cause.
    pub fn proxy_caused(&self) -> bool {
        matches!(
            self,
            FailureKind::RateLimited | FailureKind::Blocked | FailureKind::Ambiguous
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::RateLimited => "rate-limited",
            FailureKind::Blocked => "blocked",
            FailureKind::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the policy gave up on an item. Decides which report bucket it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpCause {
    /// The attempt budget ran out.
    AttemptsExhausted,
    /// The proxy rotation budget ran out.
    RotationsExhausted,
}

/// Decision returned by the retry policy for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the delay without touching proxy state.
    RetrySameProxy(Duration),
    /// Ban the proxy used for this attempt, then retry after the delay
    /// with whichever active proxy the pool serves next.
    RetryNewProxy(Duration),
    /// Stop; record the item as terminally failed.
    GiveUp(GiveUpCause),
}

/// Pure decision function over (failure kind, attempts made, rotations used).
///
/// Holds configuration only; no internal state, so concurrent workers can
/// share one copy freely.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per item (including the first).
    pub max_attempts: u32,
    /// Maximum number of proxy rotations per item.
    pub max_rotations: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            max_rotations: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after a failed attempt.
    ///
    /// `attempts_made` is 1-based (1 = the first attempt just failed);
    /// `rotations_used` counts proxies already rotated away from for this
    /// item. Proxy-caused kinds are bounded by both budgets, with rotation
    /// exhaustion checked first so the give-up cause names the proxy.
    pub fn decide(
        &self,
        kind: FailureKind,
        attempts_made: u32,
        rotations_used: u32,
    ) -> RetryDecision {
        if kind.proxy_caused() {
            if rotations_used >= self.max_rotations {
                return RetryDecision::GiveUp(GiveUpCause::RotationsExhausted);
            }
            if attempts_made >= self.max_attempts {
                return RetryDecision::GiveUp(GiveUpCause::AttemptsExhausted);
            }
            RetryDecision::RetryNewProxy(self.backoff(attempts_made))
        } else {
            if attempts_made >= self.max_attempts {
                return RetryDecision::GiveUp(GiveUpCause::AttemptsExhausted);
            }
            RetryDecision::RetrySameProxy(self.backoff(attempts_made))
        }
    }

    /// Exponential backoff: base * 2^(attempts-1), shift bounded, capped.
    fn backoff(&self, attempts_made: u32) -> Duration {
        let exp = 1u32 << attempts_made.saturating_sub(1).min(8);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_retries_same_proxy_until_attempts_exhausted() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(
            p.decide(FailureKind::Timeout, 1, 0),
            RetryDecision::RetrySameProxy(_)
        ));
        assert!(matches!(
            p.decide(FailureKind::Network, 2, 0),
            RetryDecision::RetrySameProxy(_)
        ));
        assert_eq!(
            p.decide(FailureKind::Timeout, 3, 0),
            RetryDecision::GiveUp(GiveUpCause::AttemptsExhausted)
        );
    }

    #[test]
    fn ban_signal_rotates_until_rotations_exhausted() {
        let mut p = RetryPolicy::default();
        p.max_rotations = 1;
        assert!(matches!(
            p.decide(FailureKind::RateLimited, 1, 0),
            RetryDecision::RetryNewProxy(_)
        ));
        assert_eq!(
            p.decide(FailureKind::RateLimited, 2, 1),
            RetryDecision::GiveUp(GiveUpCause::RotationsExhausted)
        );
    }

    #[test]
    fn ban_signal_is_also_bounded_by_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 2;
        p.max_rotations = 10;
        assert_eq!(
            p.decide(FailureKind::Blocked, 2, 0),
            RetryDecision::GiveUp(GiveUpCause::AttemptsExhausted)
        );
    }

    #[test]
    fn ambiguous_is_treated_as_proxy_caused() {
        let p = RetryPolicy::default();
        assert!(FailureKind::Ambiguous.proxy_caused());
        assert!(matches!(
            p.decide(FailureKind::Ambiguous, 1, 0),
            RetryDecision::RetryNewProxy(_)
        ));
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let d1 = match p.decide(FailureKind::Timeout, 1, 0) {
            RetryDecision::RetrySameProxy(d) => d,
            other => panic!("expected retry, got {:?}", other),
        };
        let d2 = match p.decide(FailureKind::Timeout, 2, 0) {
            RetryDecision::RetrySameProxy(d) => d,
            other => panic!("expected retry, got {:?}", other),
        };
        assert!(d2 >= d1);

        let d_late = match p.decide(FailureKind::Timeout, 12, 0) {
            RetryDecision::RetrySameProxy(d) => d,
            other => panic!("expected retry, got {:?}", other),
        };
        assert!(d_late <= p.max_delay);
    }
}
