//! Client-side query cache
//!
//! Results are stored by [`QueryKey`]. Concurrent reads of the same key share one
//! in-flight call, and writes declare through [`WriteOp`] which keys they make stale.

pub mod invalidation;
pub mod keys;

pub use invalidation::WriteOp;
pub use keys::QueryKey;

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

type AnyValue = Arc<dyn Any + Send + Sync>;
type Outcome = std::result::Result<AnyValue, Arc<Error>>;
type InFlight = Shared<BoxFuture<'static, Outcome>>;

#[derive(Default)]
struct Entry {
    value: Option<AnyValue>,
    updated_at: Option<Instant>,
    invalidated: bool,
    error: Option<Arc<Error>>,
    // Bumped on every invalidation; a fetch only settles into the generation it started in
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn is_stale(&self, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(at) => self.invalidated || at.elapsed() >= stale_time,
            None => true,
        }
    }

    fn fresh_value(&self, stale_time: Duration) -> Option<AnyValue> {
        if self.is_stale(stale_time) {
            None
        } else {
            self.value.clone()
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    stale_time: Duration,
    pending_mutations: AtomicUsize,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        // Entries are plain data; a panic elsewhere leaves them usable
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn settle(&self, key: &QueryKey, generation: u64, outcome: &Outcome) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            debug!(key = %key, "Discarding result of a fetch invalidated while in flight");
            return;
        }
        match outcome {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.updated_at = Some(Instant::now());
                entry.invalidated = false;
                entry.error = None;
            }
            Err(err) => {
                entry.error = Some(err.clone());
            }
        }
        entry.in_flight = None;
    }
}

/// How a view should present a key right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Error,
    Success,
}

/// Snapshot of one key, as read by [`QueryCache::state`]
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<Arc<Error>>,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    pub fn status(&self) -> QueryStatus {
        if self.data.is_some() {
            QueryStatus::Success
        } else if self.is_fetching {
            QueryStatus::Loading
        } else if self.error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Idle
        }
    }
}

/// Cloneable handle to one shared cache
///
/// Entries stay until [`QueryCache::clear`]; invalidation only marks them stale.
/// Must be used from within a tokio runtime, since fetches run on spawned tasks.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    /// A stale time of zero means every read that finds no in-flight call refetches
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                stale_time,
                pending_mutations: AtomicUsize::new(0),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// Read `key`, calling `fetch` only when nothing fresh is stored and no call is in flight
    ///
    /// The fetch runs on its own task, so it completes and settles the key even when
    /// every caller stops waiting. `fetch` is invoked without the cache lock held.
    pub async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let joined = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(value) = entry.fresh_value(self.inner.stale_time) {
                trace!(key = %key, "Cache hit");
                return downcast(&key, value);
            }
            entry.in_flight.clone()
        };

        let in_flight = match joined {
            Some(shared) => {
                debug!(key = %key, "Joining in-flight fetch");
                shared
            }
            None => {
                let fetch = fetch();
                let mut entries = self.inner.lock();
                let entry = entries.entry(key.clone()).or_default();

                // Another caller may have settled or started the key while unlocked
                if let Some(value) = entry.fresh_value(self.inner.stale_time) {
                    return downcast(&key, value);
                }
                match &entry.in_flight {
                    Some(shared) => shared.clone(),
                    None => {
                        debug!(key = %key, "Cache miss, fetching");
                        let shared = start_fetch(
                            Arc::downgrade(&self.inner),
                            key.clone(),
                            entry.generation,
                            fetch,
                        );
                        entry.in_flight = Some(shared.clone());
                        shared
                    }
                }
            }
        };

        match in_flight.await {
            Ok(value) => downcast(&key, value),
            Err(err) => Err(Error::Shared(err)),
        }
    }

    /// Mark every key starting with `prefix` stale and detach its in-flight call.
    /// Returns the number of stored keys affected.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.lock();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                entry.generation += 1;
                entry.in_flight = None;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated cache keys");
        count
    }

    /// Run a write. Nothing is cached from it; on success the keys declared by `op`
    /// are invalidated.
    pub async fn mutate<T, Fut>(&self, op: WriteOp, write: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let _pending = PendingMutation::enter(&self.inner.pending_mutations);
        let result = write.await;
        match &result {
            Ok(_) => {
                for prefix in op.invalidates() {
                    self.invalidate(&prefix);
                }
            }
            Err(err) => warn!(op = op.name(), error = %err, "Write failed, cache left untouched"),
        }
        result
    }

    pub fn is_mutating(&self) -> bool {
        self.inner.pending_mutations.load(Ordering::SeqCst) > 0
    }

    pub fn state<T>(&self, key: &QueryKey) -> QueryState<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.inner.lock();
        match entries.get(key) {
            Some(entry) => QueryState {
                data: entry
                    .value
                    .clone()
                    .and_then(|v| v.downcast::<T>().ok())
                    .map(|v| (*v).clone()),
                error: entry.error.clone(),
                is_fetching: entry.in_flight.is_some(),
                is_stale: entry.is_stale(self.inner.stale_time),
            },
            None => QueryState {
                data: None,
                error: None,
                is_fetching: false,
                is_stale: true,
            },
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::default_stale_time_secs()))
    }
}

fn start_fetch<T, Fut>(inner: Weak<Inner>, key: QueryKey, generation: u64, fetch: Fut) -> InFlight
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let task = {
        let inner = inner.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let outcome: Outcome = match fetch.await {
                Ok(value) => Ok(Arc::new(value) as AnyValue),
                Err(err) => Err(Arc::new(err)),
            };
            if let Some(inner) = inner.upgrade() {
                inner.settle(&key, generation, &outcome);
            }
            outcome
        })
    };

    async move {
        match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let outcome: Outcome = Err(Arc::new(Error::Cache(format!(
                    "Fetch for {} did not finish: {}",
                    key, join_err
                ))));
                if let Some(inner) = inner.upgrade() {
                    inner.settle(&key, generation, &outcome);
                }
                outcome
            }
        }
    }
    .boxed()
    .shared()
}

fn downcast<T: Clone + Send + Sync + 'static>(key: &QueryKey, value: AnyValue) -> Result<T> {
    value
        .downcast::<T>()
        .map(|v| (*v).clone())
        .map_err(|_| Error::Cache(format!("Key {} holds a value of another type", key)))
}

struct PendingMutation<'a>(&'a AtomicUsize);

impl<'a> PendingMutation<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
