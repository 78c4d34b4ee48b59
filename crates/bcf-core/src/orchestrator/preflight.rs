//! Preflight probe: one throwaway attempt to catch a dead configuration
//! before any worker starts.

use crate::error::ConfigError;
use crate::fetch::{Connection, Outcome};
use crate::retry::classify_failure;

use super::FetchOrchestrator;

impl FetchOrchestrator {
    /// Probe `id` once over the next connection in line. Only a
    /// ban-classified outcome fails the run; anything else (including
    /// transient errors) lets the workers start and sort it out per item.
    pub(super) async fn preflight(&self, id: &str) -> Result<(), ConfigError> {
        let connection = match self.pool.select() {
            Some(address) => {
                if self.pool.mark_used(&address) {
                    self.status.proxy_first_used();
                }
                Connection::Proxy(address)
            }
            None if self.pool.direct_allowed() => Connection::Direct,
            None => return Err(ConfigError::NoActiveProxies),
        };
        tracing::info!(id = %id, connection = %connection, "preflight probe");

        let probed = tokio::time::timeout(
            self.options.attempt_timeout,
            self.fetcher.fetch(id, &connection),
        )
        .await;
        let err = match probed {
            Ok(Ok(_)) => return Ok(()),
            Ok(Err(err)) => err,
            Err(_) => {
                tracing::debug!("preflight probe timed out, continuing");
                return Ok(());
            }
        };

        match classify_failure(&err) {
            Outcome::ProxyBanned(kind) => {
                if let Connection::Proxy(address) = &connection {
                    if self.pool.mark_banned(address, kind.as_str()) {
                        self.status.proxy_banned(self.pool.snapshot_active());
                    }
                }
                Err(ConfigError::PreflightBan {
                    connection: connection.to_string(),
                    detail: err.to_string(),
                })
            }
            _ => {
                tracing::debug!(error = %err, "preflight probe failed without ban signal, continuing");
                Ok(())
            }
        }
    }
}
