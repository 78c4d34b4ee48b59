//! Per-worker loop: dequeue, select proxy, bounded fetch, classify, act.

use std::sync::Arc;
use std::time::Duration;

use crate::control::CancelToken;
use crate::fetch::{CaptionFetcher, CaptionPayload, Connection, Outcome};
use crate::proxy::ProxyPool;
use crate::queue::{WorkItem, WorkItemQueue};
use crate::report::{Category, ItemRecord, ResultCollector};
use crate::retry::{classify_failure, FailureKind, GiveUpCause, RetryDecision, RetryPolicy};
use crate::status::StatusAggregator;

use super::RunOptions;

pub(super) struct Worker {
    pub(super) id: usize,
    pub(super) options: RunOptions,
    pub(super) policy: RetryPolicy,
    pub(super) pool: Arc<ProxyPool>,
    pub(super) fetcher: Arc<dyn CaptionFetcher>,
    pub(super) queue: Arc<WorkItemQueue>,
    pub(super) collector: Arc<ResultCollector>,
    pub(super) status: Arc<StatusAggregator>,
    pub(super) cancel: CancelToken,
}

impl Worker {
    pub(super) async fn run(self) {
        tracing::debug!(worker = self.id, "worker started");
        while let Some(item) = self.queue.next(&self.cancel).await {
            self.status.attempt_started();
            self.attempt(item).await;
            self.status.attempt_finished();

            if !self.options.attempt_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.attempt_delay) => {}
                    _ = self.cancel.cancelled() => break,
                }
            }
        }
        tracing::debug!(worker = self.id, "worker stopped");
    }

    /// One attempt for one item, through to resolution or requeue.
    async fn attempt(&self, item: WorkItem) {
        let connection = match self.pool.select() {
            Some(address) => {
                if self.pool.mark_used(&address) {
                    self.status.proxy_first_used();
                }
                Connection::Proxy(address)
            }
            None if self.pool.direct_allowed() => Connection::Direct,
            None => {
                // Every proxy is banned and direct egress is not allowed.
                self.resolve(
                    item.id,
                    item.attempt,
                    Category::ProxyFailed,
                    "no active proxy available".to_string(),
                    None,
                );
                return;
            }
        };

        let attempts_made = item.attempt + 1;
        tracing::debug!(
            id = %item.id,
            attempt = attempts_made,
            connection = %connection,
            "fetch attempt"
        );

        let fetched = tokio::time::timeout(
            self.options.attempt_timeout,
            self.fetcher.fetch(&item.id, &connection),
        )
        .await;
        let outcome = match fetched {
            Ok(Ok(payload)) => Outcome::Success(payload),
            Ok(Err(err)) => classify_failure(&err),
            Err(_) => Outcome::Retryable(FailureKind::Timeout),
        };

        match outcome {
            Outcome::Success(payload) => {
                self.resolve(
                    item.id,
                    attempts_made,
                    Category::Succeeded,
                    String::new(),
                    Some(payload),
                );
            }
            Outcome::NoResource { reason } => {
                self.resolve(item.id, attempts_made, Category::NoResource, reason, None);
            }
            Outcome::Fatal { reason } => {
                self.resolve(item.id, attempts_made, Category::Failed, reason, None);
            }
            Outcome::Retryable(kind) | Outcome::ProxyBanned(kind) => {
                self.handle_failure(item, kind, connection).await;
            }
        }
    }

    async fn handle_failure(&self, item: WorkItem, kind: FailureKind, connection: Connection) {
        if kind.proxy_caused() {
            if let Connection::Proxy(address) = &connection {
                // The failure itself is the ban evidence; record it before
                // deciding whether another attempt is in budget.
                if self.pool.mark_banned(address, kind.as_str()) {
                    self.status.proxy_banned(self.pool.snapshot_active());
                }
            }
        }

        let attempts_made = item.attempt + 1;
        match self.policy.decide(kind, attempts_made, item.rotations) {
            RetryDecision::RetrySameProxy(delay) => {
                self.backoff_requeue(item, kind, delay, false).await;
            }
            RetryDecision::RetryNewProxy(delay) => {
                self.backoff_requeue(item, kind, delay, true).await;
            }
            RetryDecision::GiveUp(cause) => {
                let (category, detail) = match cause {
                    GiveUpCause::AttemptsExhausted => (
                        Category::Failed,
                        format!("{} after {} attempts", kind, attempts_made),
                    ),
                    GiveUpCause::RotationsExhausted => (
                        Category::ProxyFailed,
                        format!("{} after {} proxy rotations", kind, item.rotations),
                    ),
                };
                tracing::warn!(id = %item.id, attempts = attempts_made, cause = %detail, "giving up");
                self.resolve(item.id, attempts_made, category, detail, None);
            }
        }
    }

    /// Sleep out the backoff, then requeue for the next attempt. The item
    /// stays out of the queue while its worker sleeps, which keeps its
    /// attempts strictly sequential.
    async fn backoff_requeue(
        &self,
        mut item: WorkItem,
        kind: FailureKind,
        delay: Duration,
        rotated: bool,
    ) {
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {
                    self.resolve(
                        item.id,
                        item.attempt + 1,
                        Category::Failed,
                        "cancelled".to_string(),
                        None,
                    );
                    return;
                }
            }
        }
        item.attempt += 1;
        if rotated {
            item.rotations += 1;
        }
        item.last_error = Some(kind);
        tracing::debug!(id = %item.id, next_attempt = item.attempt + 1, rotated, "requeued");
        self.queue.push_retry(item);
    }

    fn resolve(
        &self,
        id: String,
        attempts: u32,
        category: Category,
        detail: String,
        payload: Option<CaptionPayload>,
    ) {
        self.collector.record(
            category,
            ItemRecord {
                id,
                attempts,
                detail,
                payload,
            },
        );
        self.queue.item_resolved();
        self.status.item_resolved(category);
    }
}
