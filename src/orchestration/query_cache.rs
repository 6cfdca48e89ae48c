//! Per-key cache for remote queries with a fixed refresh interval.
//!
//! Every key owns an async mutex: concurrent callers of one key share a single
//! in-flight fetch while different keys proceed independently. Failed fetches are
//! reported to the caller and never stored. Idle keys are swept once the map
//! outgrows its last size.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Query identity plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    name: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, value: impl fmt::Display) -> Self {
        self.params.push(value.to_string());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.params.join(","))
    }
}

/// Observable state of a query without awaiting it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus<T> {
    /// No value yet: never fetched, or the first fetch is in flight.
    Pending,
    Ready(T),
    /// The most recent fetch failed and no value is cached.
    Failed(String),
}

impl<T> QueryStatus<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, QueryStatus::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            QueryStatus::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryStatus<U> {
        match self {
            QueryStatus::Pending => QueryStatus::Pending,
            QueryStatus::Ready(value) => QueryStatus::Ready(f(value)),
            QueryStatus::Failed(e) => QueryStatus::Failed(e),
        }
    }

    /// Ready only when both are ready; otherwise the first non-ready status wins.
    pub fn zip<U>(self, other: QueryStatus<U>) -> QueryStatus<(T, U)> {
        match (self, other) {
            (QueryStatus::Ready(a), QueryStatus::Ready(b)) => QueryStatus::Ready((a, b)),
            (QueryStatus::Pending, _) => QueryStatus::Pending,
            (QueryStatus::Failed(e), _) => QueryStatus::Failed(e),
            (QueryStatus::Ready(_), QueryStatus::Pending) => QueryStatus::Pending,
            (QueryStatus::Ready(_), QueryStatus::Failed(e)) => QueryStatus::Failed(e),
        }
    }
}

/// Idle entries are kept for this many refresh intervals before a sweep drops them.
const RETENTION_FACTOR: u32 = 4;
/// No sweep runs until the map holds at least this many entries.
pub const SWEEP_MIN_ENTRIES: usize = 64;

struct Cached {
    fetched_at: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

struct EntryState {
    cached: Option<Cached>,
    last_error: Option<String>,
    touched_at: Instant,
}

struct Entry {
    /// Held for the whole fetch so concurrent callers wait for one result.
    fetching: tokio::sync::Mutex<()>,
    /// Never held across an await; `status` reads it while a fetch is in flight.
    state: Mutex<EntryState>,
}

impl Entry {
    fn new() -> Self {
        Self {
            fetching: tokio::sync::Mutex::new(()),
            state: Mutex::new(EntryState {
                cached: None,
                last_error: None,
                touched_at: Instant::now(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh<T: Clone + 'static>(&self, refresh_interval: Duration) -> Option<T> {
        let state = self.state();
        let cached = state.cached.as_ref()?;
        if cached.fetched_at.elapsed() >= refresh_interval {
            return None;
        }
        cached.value.downcast_ref::<T>().cloned()
    }

    fn record<T, E>(&self, result: &Result<T, E>)
    where
        T: Clone + Send + Sync + 'static,
        E: fmt::Display,
    {
        let mut state = self.state();
        let now = Instant::now();
        state.touched_at = now;
        match result {
            Ok(value) => {
                state.cached = Some(Cached {
                    fetched_at: now,
                    value: Arc::new(value.clone()),
                });
                state.last_error = None;
            }
            // The last good value stays readable; only freshness decides a refetch.
            Err(e) => state.last_error = Some(e.to_string()),
        }
    }

    fn idle_for(&self) -> Duration {
        self.state().touched_at.elapsed()
    }
}

struct Entries {
    map: HashMap<QueryKey, Arc<Entry>>,
    sweep_at: usize,
}

pub struct QueryCache {
    refresh_interval: Duration,
    entries: Mutex<Entries>,
}

impl QueryCache {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                sweep_at: SWEEP_MIN_ENTRIES,
            }),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, key: &QueryKey) -> Arc<Entry> {
        let mut entries = self.entries();
        if let Some(entry) = entries.map.get(key) {
            return entry.clone();
        }
        if entries.map.len() >= entries.sweep_at {
            self.sweep(&mut entries);
        }
        let entry = Arc::new(Entry::new());
        entries.map.insert(key.clone(), entry.clone());
        entry
    }

    /// Drop entries nobody is using that were last fetched longer ago than the
    /// retention window. The next sweep waits until the map has doubled.
    fn sweep(&self, entries: &mut Entries) {
        let retention = self.refresh_interval.saturating_mul(RETENTION_FACTOR);
        let before = entries.map.len();
        entries
            .map
            .retain(|_, entry| Arc::strong_count(entry) > 1 || entry.idle_for() < retention);
        entries.sweep_at = SWEEP_MIN_ENTRIES.max(entries.map.len() * 2);
        debug!(
            "Query cache sweep dropped {} of {} entries",
            before - entries.map.len(),
            before
        );
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.entries().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key` if younger than the refresh interval,
    /// otherwise run `fetch` and cache its success.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let entry = self.entry(&key);
        let _fetching = entry.fetching.lock().await;

        if let Some(value) = entry.fresh::<T>(self.refresh_interval) {
            debug!("Query cache hit {}", key);
            return Ok(value);
        }

        debug!("Query cache fetch {}", key);
        let result = fetch().await;
        entry.record(&result);
        result
    }

    /// Current state of `key` without triggering a fetch.
    ///
    /// The last good value is reported as ready while it is stale, being
    /// refetched, or after a refetch failed.
    pub fn status<T: Clone + 'static>(&self, key: &QueryKey) -> QueryStatus<T> {
        let Some(entry) = self.entries().map.get(key).cloned() else {
            return QueryStatus::Pending;
        };

        let state = entry.state();
        if let Some(value) = state.cached.as_ref().and_then(|c| c.value.downcast_ref::<T>()) {
            return QueryStatus::Ready(value.clone());
        }
        match &state.last_error {
            Some(e) => QueryStatus::Failed(e.clone()),
            None => QueryStatus::Pending,
        }
    }

    /// Drop the cached value so the next read refetches.
    pub fn invalidate(&self, key: &QueryKey) {
        self.entries().map.remove(key);
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}
