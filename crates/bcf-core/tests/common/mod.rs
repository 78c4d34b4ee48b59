//! Scripted fetch client for orchestrator tests: per-id outcome scripts,
//! deterministic pseudo-random latency, optional cancellation trigger.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bcf_core::control::CancelToken;
use bcf_core::fetch::{CaptionFetcher, CaptionPayload, Connection, FetchError};

/// One scripted attempt result. Ids run their script front to back, then
/// fall through to `Ok`.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Ok,
    NoCaptions,
    Gone,
    Transient,
    RateLimited,
}

pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    latency: bool,
    calls: AtomicUsize,
    cancel_after: Option<(usize, CancelToken)>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            latency: false,
            calls: AtomicUsize::new(0),
            cancel_after: None,
        }
    }

    pub fn script(&self, id: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), steps.into());
    }

    /// Sleep a few milliseconds per call, derived from (id, call number),
    /// so runs interleave differently without being nondeterministic.
    pub fn with_latency(mut self) -> Self {
        self.latency = true;
        self
    }

    /// Trigger `token` from inside the nth fetch call (1-based).
    pub fn cancel_after(mut self, calls: usize, token: CancelToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn payload_for(id: &str) -> CaptionPayload {
    CaptionPayload {
        language: Some("en".to_string()),
        body: format!("captions for {id}"),
    }
}

#[async_trait]
impl CaptionFetcher for ScriptedFetcher {
    async fn fetch(&self, id: &str, _connection: &Connection) -> Result<CaptionPayload, FetchError> {
        let call_no = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.latency {
            let mut hasher = DefaultHasher::new();
            (id, call_no).hash(&mut hasher);
            tokio::time::sleep(Duration::from_millis(hasher.finish() % 15)).await;
        }
        if let Some((limit, token)) = &self.cancel_after {
            if call_no >= *limit {
                token.cancel();
            }
        }

        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .get_mut(id)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(Step::Ok)
        };
        match step {
            Step::Ok => Ok(payload_for(id)),
            Step::NoCaptions => Err(FetchError::NoCaptions("captions disabled".to_string())),
            Step::Gone => Err(FetchError::Gone("item removed".to_string())),
            Step::Transient => Err(FetchError::Network("connection reset".to_string())),
            Step::RateLimited => Err(FetchError::RateLimited),
        }
    }
}
