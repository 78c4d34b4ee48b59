//! Fetch orchestration: a fixed pool of workers drains the item queue,
//! one proxy-routed attempt at a time, until every item is terminally
//! resolved or the run is cancelled.
//!
//! Retry and rotation decisions live in `retry`; bucket bookkeeping in
//! `report`. The orchestrator wires them together and owns the worker
//! lifecycle.

mod preflight;
mod worker;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BcfConfig;
use crate::control::CancelToken;
use crate::error::ConfigError;
use crate::fetch::CaptionFetcher;
use crate::proxy::ProxyPool;
use crate::queue::{WorkItem, WorkItemQueue};
use crate::report::{Category, ItemRecord, ResultCollector, RunReport};
use crate::retry::RetryPolicy;
use crate::status::StatusAggregator;

use worker::Worker;

/// Loop parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Concurrent workers. Clamped to at least 1.
    pub jobs: u32,
    /// Politeness delay per worker between attempts.
    pub attempt_delay: Duration,
    /// Hard bound on each fetch invocation.
    pub attempt_timeout: Duration,
    /// Probe the first item before starting workers.
    pub preflight: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: 2,
            attempt_delay: Duration::ZERO,
            attempt_timeout: Duration::from_secs(20),
            preflight: false,
        }
    }
}

impl RunOptions {
    pub fn from_config(cfg: &BcfConfig) -> Self {
        Self {
            jobs: cfg.jobs,
            attempt_delay: Duration::from_millis(cfg.delay_ms),
            attempt_timeout: Duration::from_secs(cfg.timeout_secs),
            preflight: cfg.preflight,
        }
    }
}

/// Owns one run end to end: feeds the queue, spawns workers, waits them
/// out, drains on cancellation and seals the report.
pub struct FetchOrchestrator {
    options: RunOptions,
    policy: RetryPolicy,
    pool: Arc<ProxyPool>,
    fetcher: Arc<dyn CaptionFetcher>,
    status: Arc<StatusAggregator>,
    cancel: CancelToken,
}

impl FetchOrchestrator {
    pub fn new(
        options: RunOptions,
        policy: RetryPolicy,
        pool: Arc<ProxyPool>,
        fetcher: Arc<dyn CaptionFetcher>,
        status: Arc<StatusAggregator>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            options,
            policy,
            pool,
            fetcher,
            status,
            cancel,
        }
    }

    /// Run to completion. The returned report partitions every distinct id
    /// exactly once; an error means no worker ever started.
    pub async fn run(
        self,
        ids: impl IntoIterator<Item = String>,
    ) -> Result<RunReport, ConfigError> {
        let queue = Arc::new(WorkItemQueue::new());
        let collector = Arc::new(ResultCollector::new());

        let mut seen: HashSet<String> = HashSet::new();
        let mut first_id: Option<String> = None;
        for id in ids {
            if !seen.insert(id.clone()) {
                tracing::debug!(id = %id, "duplicate item skipped");
                continue;
            }
            if first_id.is_none() {
                first_id = Some(id.clone());
            }
            queue.push_new(WorkItem::new(id));
        }
        queue.close();

        let total = seen.len() as u64;
        self.status.set_total(total);
        self.status.set_active_proxies(self.pool.snapshot_active());

        if self.options.preflight {
            if let Some(id) = &first_id {
                self.preflight(id).await?;
            }
        }

        let jobs = self.options.jobs.max(1) as usize;
        tracing::info!(
            items = total,
            jobs,
            proxies = self.pool.active_count(),
            "fetch run started"
        );

        let mut join_set = tokio::task::JoinSet::new();
        for worker_id in 0..jobs {
            let worker = Worker {
                id: worker_id,
                options: self.options.clone(),
                policy: self.policy,
                pool: Arc::clone(&self.pool),
                fetcher: Arc::clone(&self.fetcher),
                queue: Arc::clone(&queue),
                collector: Arc::clone(&collector),
                status: Arc::clone(&self.status),
                cancel: self.cancel.clone(),
            };
            join_set.spawn(worker.run());
        }
        while let Some(joined) = join_set.join_next().await {
            if let Err(err) = joined {
                tracing::error!("worker task join: {err}");
            }
        }

        // Whatever is still queued after the workers stop was cut off by
        // cancellation; resolve it without further attempts.
        for item in queue.drain() {
            collector.record(
                Category::Failed,
                ItemRecord {
                    id: item.id,
                    attempts: item.attempt,
                    detail: "cancelled".to_string(),
                    payload: None,
                },
            );
            queue.item_resolved();
            self.status.item_resolved(Category::Failed);
        }

        let report = collector.finish(self.pool.banned(), self.pool.snapshot_active());
        tracing::info!(
            ok = report.succeeded.len(),
            no_captions = report.no_resource.len(),
            failed = report.failed.len(),
            proxy_failed = report.proxy_failed.len(),
            banned = report.banned_proxies.len(),
            cancelled = self.cancel.is_cancelled(),
            "fetch run finished"
        );
        Ok(report)
    }
}
