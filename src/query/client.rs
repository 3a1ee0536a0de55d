//! Keyed query cache with in-flight deduplication
//!
//! A [`Query`] bundles a [`CacheKey`], a fetch operation and
//! [`QueryOptions`]. [`QueryClient::fetch`] runs it:
//!
//! - concurrent fetches of an equal key share one request
//! - every caller waits with its own [`CancellationToken`]; when the last
//!   waiter cancels (or drops its future) the request is aborted
//! - an aborted request never writes to the cache
//! - failures are stored and returned inline, or escalated as `Err` when the
//!   query uses an error boundary

use super::key::CacheKey;
use super::observer::QueryObserver;
use super::options::QueryOptions;
use super::state::QueryState;
use crate::error::{ClientError, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type FetchFn = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

// ============================================================================
// Query descriptor
// ============================================================================

/// Key, fetch operation and options of one cached resource
#[derive(Clone)]
pub struct Query {
    key: CacheKey,
    options: QueryOptions,
    fetch: FetchFn,
}

impl Query {
    /// The fetch operation receives the request's cancellation token
    pub fn new<F, Fut>(key: CacheKey, fetch: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            key,
            options: QueryOptions::default(),
            fetch: Arc::new(move |cancel| fetch(cancel).boxed()),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Cache internals
// ============================================================================

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    data: Option<Value>,
    error: Option<Arc<ClientError>>,
    data_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
enum FetchOutcome {
    Done,
    Cancelled,
    Failed,
}

type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct InFlight {
    id: u64,
    shared: SharedFetch,
    cancel: CancellationToken,
    waiters: Arc<AtomicUsize>,
}

struct Inner {
    cache: DashMap<CacheKey, CacheEntry>,
    in_flight: DashMap<CacheKey, InFlight>,
    next_id: AtomicU64,
    focused: watch::Sender<bool>,
}

impl Inner {
    fn store_success(&self, key: &CacheKey, data: Value) {
        let mut entry = self.cache.entry(key.clone()).or_default();
        entry.data = Some(data);
        entry.error = None;
        entry.data_updated_at = Some(Utc::now());
    }

    fn store_error(&self, key: &CacheKey, error: Arc<ClientError>) {
        self.cache.entry(key.clone()).or_default().error = Some(error);
    }

    fn finish(&self, key: &CacheKey, id: u64) {
        self.in_flight.remove_if(key, |_, f| f.id == id);
    }
}

/// Registration of one caller on an in-flight request
struct Waiter {
    inner: Arc<Inner>,
    key: CacheKey,
    id: u64,
    shared: SharedFetch,
    cancel: CancellationToken,
    waiters: Arc<AtomicUsize>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if self.waiters.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        // Joining happens under the same shard lock, so a caller that
        // arrived meanwhile keeps the request alive.
        let removed = self.inner.in_flight.remove_if(&self.key, |_, f| {
            f.id == self.id && f.waiters.load(Ordering::SeqCst) == 0
        });
        if removed.is_some() {
            self.cancel.cancel();
            info!(key = %self.key, "aborted request with no remaining waiters");
        }
    }
}

// ============================================================================
// QueryClient
// ============================================================================

/// Shared query cache
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("cached", &self.inner.cache.len())
            .field("in_flight", &self.inner.in_flight.len())
            .field("focused", &*self.inner.focused.borrow())
            .finish()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        let (focused, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                cache: DashMap::new(),
                in_flight: DashMap::new(),
                next_id: AtomicU64::new(1),
                focused,
            }),
        }
    }

    /// Run `query` once, joining an in-flight request for the same key.
    ///
    /// Cancelling `cancel` returns the current cached state without an
    /// error. Failures of error-boundary queries come back as
    /// [`ClientError::Escalated`].
    pub async fn fetch(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<QueryState<Value>> {
        if !query.options.enabled {
            debug!(key = %query.key, "query disabled, not fetching");
            return Ok(self.state(query));
        }

        let waiter = self.join_or_start(query);
        let shared = waiter.shared.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => FetchOutcome::Cancelled,
            outcome = shared => outcome,
        };
        drop(waiter);

        let state = self.state(query);
        if let FetchOutcome::Cancelled = outcome {
            debug!(key = %query.key, "fetch cancelled");
            return Ok(state);
        }
        if query.options.use_error_boundary {
            if let Some(source) = state.error.clone() {
                error!(key = %query.key, error = %source, "query failed, escalating");
                return Err(ClientError::Escalated {
                    key: query.key.to_string(),
                    source,
                });
            }
        }
        Ok(state)
    }

    fn join_or_start(&self, query: &Query) -> Waiter {
        match self.inner.in_flight.entry(query.key.clone()) {
            Entry::Occupied(occupied) => {
                let flight = occupied.get();
                flight.waiters.fetch_add(1, Ordering::SeqCst);
                debug!(key = %query.key, "joining in-flight request");
                Waiter {
                    inner: self.inner.clone(),
                    key: query.key.clone(),
                    id: flight.id,
                    shared: flight.shared.clone(),
                    cancel: flight.cancel.clone(),
                    waiters: flight.waiters.clone(),
                }
            }
            Entry::Vacant(vacant) => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                let cancel = CancellationToken::new();
                let waiters = Arc::new(AtomicUsize::new(1));
                let shared = self.request(query, id, cancel.clone());
                vacant.insert(InFlight {
                    id,
                    shared: shared.clone(),
                    cancel: cancel.clone(),
                    waiters: waiters.clone(),
                });
                Waiter {
                    inner: self.inner.clone(),
                    key: query.key.clone(),
                    id,
                    shared,
                    cancel,
                    waiters,
                }
            }
        }
    }

    fn request(&self, query: &Query, id: u64, cancel: CancellationToken) -> SharedFetch {
        let inner = self.inner.clone();
        let key = query.key.clone();
        let fetch = (query.fetch)(cancel.clone());

        async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = fetch => result,
            };
            let outcome = match result {
                Ok(data) => {
                    inner.store_success(&key, data);
                    FetchOutcome::Done
                }
                Err(e) if e.is_cancelled() => FetchOutcome::Cancelled,
                Err(e) => {
                    warn!(key = %key, error = %e, "fetch failed");
                    inner.store_error(&key, Arc::new(e));
                    FetchOutcome::Failed
                }
            };
            inner.finish(&key, id);
            outcome
        }
        .boxed()
        .shared()
    }

    /// Current state of `query` from the cache, reshaped by its `select`
    pub fn state(&self, query: &Query) -> QueryState<Value> {
        let is_fetching = self.is_fetching(&query.key);
        let entry = self
            .inner
            .cache
            .get(&query.key)
            .map(|e| e.value().clone())
            .unwrap_or_default();

        let mut error = entry.error;
        let data = match (entry.data, query.options.select) {
            (Some(data), Some(select)) => match select.apply(&data) {
                Ok(selected) => Some(selected),
                Err(e) => {
                    error = Some(Arc::new(e));
                    None
                }
            },
            (data, _) => data,
        };

        QueryState::from_parts(data, error, entry.data_updated_at, is_fetching)
    }

    /// Raw cached response for `key`
    pub fn get_query_data(&self, key: &CacheKey) -> Option<Value> {
        self.inner.cache.get(key).and_then(|e| e.data.clone())
    }

    /// Seed or overwrite the cached response for `key`
    pub fn set_query_data(&self, key: CacheKey, data: Value) {
        self.inner.store_success(&key, data);
    }

    /// Drop cached entries matching `predicate`; returns how many were removed
    pub fn invalidate(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let before = self.inner.cache.len();
        self.inner.cache.retain(|key, _| !predicate(key));
        let removed = before.saturating_sub(self.inner.cache.len());
        debug!(removed, "invalidated cached queries");
        removed
    }

    /// Abort in-flight requests matching `predicate` without writing results
    pub fn cancel_queries(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let mut cancelled = 0;
        for flight in self.inner.in_flight.iter() {
            if predicate(flight.key()) {
                flight.cancel.cancel();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            info!(cancelled, "cancelled in-flight queries");
        }
        cancelled
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.inner.in_flight.contains_key(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }

    /// Report application focus; observers react to regained focus
    pub fn set_focused(&self, focused: bool) {
        let previous = self.inner.focused.send_replace(focused);
        if previous != focused {
            debug!(focused, "focus changed");
        }
    }

    pub fn is_focused(&self) -> bool {
        *self.inner.focused.borrow()
    }

    pub(crate) fn subscribe_focus(&self) -> watch::Receiver<bool> {
        self.inner.focused.subscribe()
    }

    /// Start a long-lived observer for `query`; needs a tokio runtime
    pub fn observe(&self, query: Query) -> QueryObserver {
        QueryObserver::spawn(self.clone(), query)
    }
}
