//! Fetch client seam: the trait workers call to retrieve one caption track,
//! plus the payload, connection and error types that cross it.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// How a single fetch attempt reaches the upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// No proxy; egress via the local network identity.
    Direct,
    /// Egress via the proxy at this address (e.g. `http://1.2.3.4:8080`).
    Proxy(String),
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Direct => write!(f, "direct"),
            Connection::Proxy(addr) => write!(f, "{}", addr),
        }
    }
}

/// One fetched caption track. The engine never looks inside `body`.
#[derive(Debug, Clone)]
pub struct CaptionPayload {
    /// Language the track was requested/served in, when known.
    pub language: Option<String>,
    /// Raw caption document as returned by the upstream endpoint.
    pub body: String,
}

/// Typed failure of a single fetch attempt, as reported by the client.
///
/// Clients map their transport-level errors (HTTP statuses, socket errors)
/// into these variants; the engine only ever matches on the variant.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The item exists but has no caption track to serve.
    #[error("no captions: {0}")]
    NoCaptions(String),
    /// The item itself is gone or was never there.
    #[error("resource gone: {0}")]
    Gone(String),
    /// The attempt exceeded its time budget.
    #[error("request timed out")]
    Timeout,
    /// Connection-level failure (reset, DNS, unreachable proxy).
    #[error("network error: {0}")]
    Network(String),
    /// Upstream asked us to slow down (HTTP 429 signature).
    #[error("rate limited by upstream")]
    RateLimited,
    /// Upstream refused this egress identity (HTTP 403 signature).
    #[error("blocked by upstream")]
    Blocked,
    /// Any other HTTP status the client did not map more precisely.
    #[error("upstream HTTP status {0}")]
    UpstreamStatus(u32),
    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// What one fetch attempt amounted to, after classification.
///
/// Produced exactly once per attempt and exhaustively matched by the
/// orchestrator; retry decisions are driven by the variant, never by
/// string inspection.
#[derive(Debug)]
pub enum Outcome {
    /// Payload retrieved; the item is done.
    Success(CaptionPayload),
    /// The item legitimately has no captions. Terminal, not a failure.
    NoResource { reason: String },
    /// Transient, proxy-independent failure; worth retrying as-is.
    Retryable(crate::retry::FailureKind),
    /// The proxy used for this attempt is the likely culprit.
    ProxyBanned(crate::retry::FailureKind),
    /// Permanent failure; retrying cannot help.
    Fatal { reason: String },
}

/// Retrieves the caption track for one item over the given connection.
///
/// Implementations own all transport detail (endpoint, headers, proxies)
/// and must bound their own I/O; the orchestrator additionally enforces a
/// per-attempt timeout around each call.
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    async fn fetch(&self, id: &str, connection: &Connection) -> Result<CaptionPayload, FetchError>;
}
