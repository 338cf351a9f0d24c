// Tagged query cache.
// Caches request results by key, coalesces duplicate in-flight requests,
// and broadcasts every state transition to per-key watchers.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::Result;

use super::state::{EntrySnapshot, QueryKey, QueryState, Tag};

/// One cached request.
struct Entry<T> {
    /// Latest state plus the broadcast channel carrying it.
    tx: watch::Sender<QueryState<T>>,
    /// Invalidation labels attached by the most recent fetch.
    tags: HashSet<Tag>,
    /// Set on invalidation; a stale entry keeps its state but is not a hit.
    stale: bool,
    /// Bumped on invalidation. A flight that lands under an older epoch is
    /// discarded and the request re-run.
    epoch: u64,
    /// A request for this key is currently running.
    in_flight: bool,
    /// When the entry last changed state.
    updated_at: DateTime<Utc>,
}

impl<T: Clone> Entry<T> {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(QueryState::Idle);
        Self {
            tx,
            tags: HashSet::new(),
            stale: true,
            epoch: 0,
            in_flight: false,
            updated_at: Utc::now(),
        }
    }

    fn state(&self) -> QueryState<T> {
        self.tx.borrow().clone()
    }

    fn publish(&mut self, state: QueryState<T>) {
        self.updated_at = Utc::now();
        self.tx.send_replace(state);
    }
}

/// What a fetch call decided to do after inspecting the entry.
enum Role<T> {
    Hit(QueryState<T>),
    Wait(watch::Receiver<QueryState<T>>),
    Run { epoch: u64 },
}

/// Resets an abandoned flight so the key is not wedged in loading when the
/// runner's future is dropped before it settles.
struct FlightGuard<'a, T: Clone + Send + Sync> {
    cache: &'a QueryCache<T>,
    key: &'a QueryKey,
    armed: bool,
}

impl<'a, T: Clone + Send + Sync> FlightGuard<'a, T> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<'a, T: Clone + Send + Sync> Drop for FlightGuard<'a, T> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.abandon(self.key);
        }
    }
}

/// Cache of request results keyed by [`QueryKey`].
///
/// Entries move idle -> loading -> success/error. A success entry is served
/// without a new request until a tag invalidation or an explicit refetch
/// marks it stale; an error entry is never served as a hit. Concurrent
/// fetches for one key share a single outbound flight.
pub struct QueryCache<T> {
    entries: Mutex<HashMap<QueryKey, Entry<T>>>,
}

impl<T: Clone + Send + Sync> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the resource behind `key`, attaching `tags` to its entry.
    ///
    /// `run` produces the request future and is invoked at most once per
    /// outbound flight: cache hits and coalesced callers never invoke it,
    /// and it runs again only when an invalidation lands mid-flight and the
    /// now-stale response has to be thrown away.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, tags: &[Tag], run: F) -> QueryState<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            let role = {
                let mut table = self.table();
                let entry = table.entry(key.clone()).or_insert_with(Entry::new);
                let current = entry.state();
                if current.is_success() && !entry.stale {
                    Role::Hit(current)
                } else if entry.in_flight {
                    Role::Wait(entry.tx.subscribe())
                } else {
                    entry.in_flight = true;
                    entry.stale = false;
                    entry.tags = tags.iter().cloned().collect();
                    entry.publish(QueryState::Loading);
                    Role::Run { epoch: entry.epoch }
                }
            };

            match role {
                Role::Hit(state) => {
                    tracing::debug!(key = %key, "cache hit");
                    return state;
                }
                Role::Wait(mut rx) => {
                    tracing::debug!(key = %key, "joining in-flight request");
                    match rx.wait_for(|state| !state.is_loading()).await {
                        // The shared flight settled; hand its result out.
                        Ok(state) if state.is_settled() => return state.clone(),
                        // Flight abandoned or table cleared; start over.
                        _ => continue,
                    }
                }
                Role::Run { epoch } => {
                    let mut flight = FlightGuard {
                        cache: self,
                        key,
                        armed: true,
                    };
                    let outcome = run().await;

                    let mut table = self.table();
                    flight.disarm();
                    let Some(entry) = table.get_mut(key) else {
                        // Table cleared mid-flight; deliver the result
                        // without resurrecting the entry.
                        return settle(outcome);
                    };
                    entry.in_flight = false;
                    if entry.epoch != epoch {
                        tracing::debug!(key = %key, "discarding response that landed after invalidation");
                        continue;
                    }
                    let state = settle(outcome);
                    if let QueryState::Error(err) = &state {
                        tracing::warn!(key = %key, error = %err, "query failed");
                    }
                    entry.publish(state.clone());
                    return state;
                }
            }
        }
    }

    /// Force a fresh request even when the entry is fresh. If a flight is
    /// already running, the caller joins it instead of queueing another.
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, tags: &[Tag], run: F) -> QueryState<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let mut table = self.table();
            if let Some(entry) = table.get_mut(key) {
                if !entry.in_flight {
                    entry.stale = true;
                }
            }
        }
        self.fetch(key, tags, run).await
    }

    /// Mark stale every entry whose tag set intersects `tags`. Returns the
    /// number of entries marked. States are untouched; the next access for
    /// a marked key goes back through loading.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut table = self.table();
        let mut marked = 0;
        for (key, entry) in table.iter_mut() {
            if tags.iter().any(|tag| entry.tags.contains(tag)) {
                entry.stale = true;
                entry.epoch += 1;
                marked += 1;
                tracing::debug!(key = %key, "invalidated by tag");
            }
        }
        marked
    }

    /// Treat every entry as invalidated, in-flight requests included.
    pub fn mark_all_stale(&self) {
        let mut table = self.table();
        for entry in table.values_mut() {
            entry.stale = true;
            entry.epoch += 1;
        }
    }

    /// Observe every state transition for `key`. Subscribing creates an
    /// idle entry when none exists yet.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QueryState<T>> {
        let mut table = self.table();
        table
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .tx
            .subscribe()
    }

    /// Current state for `key`, `Idle` when the key has never been seen.
    pub fn state(&self, key: &QueryKey) -> QueryState<T> {
        self.table()
            .get(key)
            .map(|entry| entry.state())
            .unwrap_or(QueryState::Idle)
    }

    /// Point-in-time view of the entry behind `key`.
    pub fn snapshot(&self, key: &QueryKey) -> Option<EntrySnapshot<T>> {
        let table = self.table();
        let entry = table.get(key)?;
        Some(EntrySnapshot {
            key: key.clone(),
            state: entry.state(),
            tags: entry.tags.clone(),
            stale: entry.stale,
            updated_at: entry.updated_at,
        })
    }

    /// Keys that currently have live subscribers.
    pub fn subscribed_keys(&self) -> Vec<QueryKey> {
        self.table()
            .iter()
            .filter(|(_, entry)| entry.tx.receiver_count() > 0)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Drop every entry. Outstanding watchers observe their channel close.
    pub fn clear(&self) {
        self.table().clear();
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Reset a flight whose runner was dropped before it settled.
    fn abandon(&self, key: &QueryKey) {
        let mut table = self.table();
        if let Some(entry) = table.get_mut(key) {
            if entry.in_flight {
                entry.in_flight = false;
                entry.stale = true;
                entry.publish(QueryState::Idle);
                tracing::debug!(key = %key, "request abandoned before completion");
            }
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry<T>>> {
        // Never held across an await; a poisoned guard still holds a
        // consistent table.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone + Send + Sync> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn settle<T>(outcome: Result<T>) -> QueryState<T> {
    match outcome {
        Ok(data) => QueryState::Success(data),
        Err(err) => QueryState::Error(err),
    }
}
