//! Fatal pre-flight errors. Everything after worker start is report data, not an error.

use thiserror::Error;

/// The only error a fetch run surfaces to the caller. Raised before any
/// worker has started; per-item failures end up in the run report instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The proxy pool came up empty and direct connections were not allowed.
    #[error("no active proxies and direct connections are not allowed")]
    NoActiveProxies,
    /// The preflight probe hit a ban signal, so every worker would too.
    #[error("preflight probe hit a ban signal via {connection}: {detail}")]
    PreflightBan { connection: String, detail: String },
    /// A proxy source could not be turned into usable addresses.
    #[error("proxy source unusable: {detail}")]
    ProxySource { detail: String },
}
