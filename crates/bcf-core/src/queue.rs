//! Work item queue: multi-producer multi-consumer source of fetch work.
//!
//! Retries re-produce into the queue, so "empty" does not mean "done":
//! consumers only get `None` once the queue is closed and every item
//! pushed has been terminally resolved, or on cancellation.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

use crate::control::CancelToken;
use crate::retry::FailureKind;

/// One unit of fetch work, tracked through attempts to a terminal outcome.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Stable external key (video identifier).
    pub id: String,
    /// Attempts already made, 0 for a fresh item.
    pub attempt: u32,
    /// Proxy rotations already spent on this item.
    pub rotations: u32,
    /// Classification of the most recent failed attempt.
    pub last_error: Option<FailureKind>,
}

impl WorkItem {
    pub fn new(id: String) -> Self {
        Self {
            id,
            attempt: 0,
            rotations: 0,
            last_error: None,
        }
    }
}

struct QueueState {
    items: VecDeque<WorkItem>,
    /// Items pushed via `push_new` and not yet terminally resolved.
    /// Requeued items are already counted, so retries leave this alone.
    outstanding: usize,
    closed: bool,
}

/// Concurrency-safe queue shared by the feeder and all workers.
pub struct WorkItemQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl Default for WorkItemQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkItemQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                outstanding: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Enqueue a fresh item from the enumerator.
    pub fn push_new(&self, item: WorkItem) {
        let mut state = self.state.lock().unwrap();
        state.outstanding += 1;
        state.items.push_back(item);
        drop(state);
        self.notify.notify_waiters();
    }

    /// Re-enqueue an item for another attempt. The item is still counted
    /// as outstanding from its original `push_new`.
    pub fn push_retry(&self, item: WorkItem) {
        let mut state = self.state.lock().unwrap();
        state.items.push_back(item);
        drop(state);
        self.notify.notify_waiters();
    }

    /// Mark one item terminally resolved. Once the count reaches zero on a
    /// closed queue, parked consumers wake up and drain out.
    pub fn item_resolved(&self) {
        let mut state = self.state.lock().unwrap();
        state.outstanding = state.outstanding.saturating_sub(1);
        let done = state.closed && state.outstanding == 0;
        drop(state);
        if done {
            self.notify.notify_waiters();
        }
    }

    /// No more fresh items will arrive; retries may still be pushed.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    /// Next item to work on. Waits while the queue is momentarily empty
    /// but unresolved items may still be requeued. Returns `None` once the
    /// queue is closed and fully resolved, or when `cancel` fires.
    pub async fn next(&self, cancel: &CancelToken) -> Option<WorkItem> {
        loop {
            // Register interest before checking, so a push between the
            // check and the await still wakes us.
            let notified = self.notify.notified();
            if cancel.is_cancelled() {
                return None;
            }
            {
                let mut state = self.state.lock().unwrap();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed && state.outstanding == 0 {
                    return None;
                }
            }
            tokio::select! {
                _ = notified => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    /// Remove and return everything still queued (cancellation drain).
    pub fn drain(&self) -> Vec<WorkItem> {
        let mut state = self.state.lock().unwrap();
        state.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn yields_items_then_none_after_close_and_resolution() {
        let queue = WorkItemQueue::new();
        let cancel = CancelToken::new();
        queue.push_new(WorkItem::new("a".into()));
        queue.push_new(WorkItem::new("b".into()));
        queue.close();

        assert_eq!(queue.next(&cancel).await.unwrap().id, "a");
        queue.item_resolved();
        assert_eq!(queue.next(&cancel).await.unwrap().id, "b");
        queue.item_resolved();
        assert!(queue.next(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn waits_for_requeue_of_outstanding_item() {
        let queue = Arc::new(WorkItemQueue::new());
        let cancel = CancelToken::new();
        queue.push_new(WorkItem::new("a".into()));
        queue.close();

        let mut item = queue.next(&cancel).await.unwrap();
        assert!(queue.is_empty());

        // The queue is empty but "a" is still outstanding, so a second
        // consumer must wait for the retry rather than seeing the end.
        let q = Arc::clone(&queue);
        let requeue = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            item.attempt += 1;
            q.push_retry(item);
        });

        let retried = queue.next(&cancel).await.unwrap();
        assert_eq!(retried.id, "a");
        assert_eq!(retried.attempt, 1);
        requeue.await.unwrap();

        queue.item_resolved();
        assert!(queue.next(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn cancellation_wakes_waiting_consumers() {
        let queue = Arc::new(WorkItemQueue::new());
        let cancel = CancelToken::new();

        let q = Arc::clone(&queue);
        let c = cancel.clone();
        let waiter = tokio::spawn(async move { q.next(&c).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        assert!(waiter.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drain_empties_remaining_items() {
        let queue = WorkItemQueue::new();
        let cancel = CancelToken::new();
        queue.push_new(WorkItem::new("a".into()));
        queue.push_new(WorkItem::new("b".into()));
        queue.close();
        cancel.cancel();

        assert!(queue.next(&cancel).await.is_none());
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }
}
