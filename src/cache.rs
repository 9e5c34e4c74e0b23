// Keyed, coalescing cache in front of an AnalyticsSource.
//
// Every key owns a watch channel holding its current snapshot. The entry
// table lock is held while a key moves to Loading and its fetch task is
// spawned, so there is never more than one fetch in flight per key.

use crate::fetcher::{validate_terms, AnalyticsSource};
use crate::model::{CompareError, ComparisonResult};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

const QUERY_KEY: &str = "compare-search-terms";
const EVENT_CAPACITY: usize = 64;

/// Ordered, trimmed term pair. Case and order are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    term1: String,
    term2: String,
}

impl CacheKey {
    pub fn new(term1: &str, term2: &str) -> Result<Self, CompareError> {
        let (term1, term2) = validate_terms(term1, term2)?;
        Ok(Self {
            term1: term1.to_string(),
            term2: term2.to_string(),
        })
    }

    pub fn term1(&self) -> &str {
        &self.term1
    }

    pub fn term2(&self) -> &str {
        &self.term2
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:?}, {:?}]", QUERY_KEY, self.term1, self.term2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything an observer needs to render one key.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub key: CacheKey,
    pub status: CacheStatus,
    /// Last successful value. Survives later failed refreshes.
    pub data: Option<Arc<ComparisonResult>>,
    pub error: Option<CompareError>,
    pub requested_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    fn idle(key: CacheKey) -> Self {
        Self {
            key,
            status: CacheStatus::Idle,
            data: None,
            error: None,
            requested_at: None,
            updated_at: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == CacheStatus::Loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Reuse a successful entry instead of fetching again.
    IfChanged,
    /// Fetch even if the entry already holds data.
    Force,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new fetch was spawned for the key.
    Started,
    /// A fetch for the key was already in flight.
    Joined,
    /// The key already holds a successful value.
    Unchanged,
}

impl RequestOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            RequestOutcome::Started => "Fetching comparison",
            RequestOutcome::Joined => "Waiting for comparison in progress",
            RequestOutcome::Unchanged => "No changes to compare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub key: CacheKey,
    pub from: CacheStatus,
    pub to: CacheStatus,
}

struct Inner {
    source: Arc<dyn AnalyticsSource>,
    entries: Mutex<HashMap<CacheKey, watch::Sender<CacheSnapshot>>>,
    events: broadcast::Sender<StatusChange>,
}

impl Inner {
    /// Applies `update` to the key's snapshot and notifies observers.
    fn publish(&self, state: &watch::Sender<CacheSnapshot>, update: impl FnOnce(&mut CacheSnapshot)) {
        let mut next = state.borrow().clone();
        let from = next.status;
        update(&mut next);
        let change = StatusChange {
            key: next.key.clone(),
            from,
            to: next.status,
        };
        state.send_replace(next);

        info!("{}: {:?} -> {:?}", change.key, change.from, change.to);
        // No subscribers is fine.
        let _ = self.events.send(change);
    }

    async fn complete(&self, key: &CacheKey, result: Result<ComparisonResult, CompareError>) {
        let entries = self.entries.lock().await;
        let Some(state) = entries.get(key) else {
            warn!("{}: fetch finished for unknown key", key);
            return;
        };

        match result {
            Ok(value) => self.publish(state, |s| {
                s.status = CacheStatus::Success;
                s.data = Some(Arc::new(value));
                s.error = None;
                s.updated_at = Some(Utc::now());
            }),
            Err(e) => {
                warn!("{}: fetch failed: {}", key, e);
                self.publish(state, |s| {
                    s.status = CacheStatus::Error;
                    s.error = Some(e);
                    s.updated_at = Some(Utc::now());
                })
            }
        }
    }
}

/// Cheap to clone; clones share one entry table.
#[derive(Clone)]
pub struct ComparisonCache {
    inner: Arc<Inner>,
}

impl ComparisonCache {
    pub fn new(source: Arc<dyn AnalyticsSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                source,
                entries: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Starts, joins or skips a fetch for `key` without waiting for it.
    pub async fn request(&self, key: &CacheKey, mode: FetchMode) -> RequestOutcome {
        self.register(key, mode).await.0
    }

    /// Fetches the pair through the cache and waits for the outcome.
    pub async fn fetch(&self, term1: &str, term2: &str) -> Result<Arc<ComparisonResult>, CompareError> {
        let key = CacheKey::new(term1, term2)?;
        self.fetch_key(&key, FetchMode::IfChanged).await
    }

    pub async fn fetch_key(
        &self,
        key: &CacheKey,
        mode: FetchMode,
    ) -> Result<Arc<ComparisonResult>, CompareError> {
        let (outcome, mut rx) = self.register(key, mode).await;
        debug!("{}: {}", key, outcome.describe());

        let snapshot = rx
            .wait_for(|s| !s.is_loading())
            .await
            .map_err(|_| CompareError::Transport("comparison cache was dropped".into()))?
            .clone();

        match snapshot.status {
            CacheStatus::Success => snapshot
                .data
                .ok_or_else(|| CompareError::Schema("successful entry without data".into())),
            CacheStatus::Error => Err(snapshot
                .error
                .unwrap_or_else(|| CompareError::Transport("unknown failure".into()))),
            CacheStatus::Idle | CacheStatus::Loading => {
                Err(CompareError::Transport("comparison did not complete".into()))
            }
        }
    }

    /// Current state of `key`; `Idle` when it was never requested.
    pub async fn snapshot(&self, key: &CacheKey) -> CacheSnapshot {
        let entries = self.inner.entries.lock().await;
        entries
            .get(key)
            .map(|state| state.borrow().clone())
            .unwrap_or_else(|| CacheSnapshot::idle(key.clone()))
    }

    /// Watches one key. The receiver always holds the latest snapshot.
    pub async fn subscribe(&self, key: &CacheKey) -> watch::Receiver<CacheSnapshot> {
        let mut entries = self.inner.entries.lock().await;
        entries
            .entry(key.clone())
            .or_insert_with(|| watch::channel(CacheSnapshot::idle(key.clone())).0)
            .subscribe()
    }

    /// Every status transition of every key.
    pub fn events(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.events.subscribe()
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn register(
        &self,
        key: &CacheKey,
        mode: FetchMode,
    ) -> (RequestOutcome, watch::Receiver<CacheSnapshot>) {
        let mut entries = self.inner.entries.lock().await;
        let state = entries
            .entry(key.clone())
            .or_insert_with(|| watch::channel(CacheSnapshot::idle(key.clone())).0);
        let rx = state.subscribe();

        let current = state.borrow().status;
        let outcome = match (current, mode) {
            (CacheStatus::Loading, _) => RequestOutcome::Joined,
            (CacheStatus::Success, FetchMode::IfChanged) => RequestOutcome::Unchanged,
            _ => RequestOutcome::Started,
        };

        if outcome == RequestOutcome::Started {
            let now = Utc::now();
            self.inner.publish(state, |s| {
                s.status = CacheStatus::Loading;
                s.requested_at = Some(now);
            });
            self.spawn_fetch(key.clone());
        }

        (outcome, rx)
    }

    // The task keeps its own handle on the cache so the result lands even
    // when nobody is waiting for it any more.
    fn spawn_fetch(&self, key: CacheKey) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = AssertUnwindSafe(inner.source.fetch(key.term1(), key.term2()))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(CompareError::Transport("analytics source panicked".into())));
            inner.complete(&key, result).await;
        });
    }
}
