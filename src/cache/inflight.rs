//! In-flight query tracking.
//!
//! At most one fetch runs per query key; later callers join the running fetch
//! and observe the same result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::application::routes::RouteError;

use super::keys::QueryKey;
use super::store::CachedValue;

pub type FetchResult = Result<CachedValue, RouteError>;
pub type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlightFetch {
    future: SharedFetch,
    invalidated: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct InFlightQueries {
    fetches: DashMap<QueryKey, InFlightFetch>,
}

impl InFlightQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the fetch running for `key`, or start one with `start`.
    ///
    /// `start` receives the flag that [`mark_invalidated`](Self::mark_invalidated)
    /// sets when a tag of `key` is invalidated mid-flight. Returns the shared
    /// fetch and whether this call started it.
    pub fn join_or_start<F>(&self, key: &QueryKey, start: F) -> (SharedFetch, bool)
    where
        F: FnOnce(Arc<AtomicBool>) -> BoxFuture<'static, FetchResult>,
    {
        match self.fetches.entry(key.clone()) {
            Entry::Occupied(running) => (running.get().future.clone(), false),
            Entry::Vacant(vacant) => {
                let invalidated = Arc::new(AtomicBool::new(false));
                let future = start(Arc::clone(&invalidated)).shared();
                vacant.insert(InFlightFetch {
                    future: future.clone(),
                    invalidated,
                });
                (future, true)
            }
        }
    }

    /// Flag the running fetch for `key`, if any, so its result is stored stale.
    pub fn mark_invalidated(&self, key: &QueryKey) -> bool {
        match self.fetches.get(key) {
            Some(running) => {
                running.invalidated.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn finish(&self, key: &QueryKey) {
        self.fetches.remove(key);
    }

    pub fn len(&self) -> usize {
        self.fetches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }
}
