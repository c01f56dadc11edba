//! Cached query/mutation client.
//!
//! Queries are served from the [`QueryStore`] while fresh and fetched through
//! the [`RouteAdapter`] otherwise, with concurrent identical fetches joined.
//! A successful mutation marks every entry depending on its tags stale.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use axum::http::Method;
use futures::FutureExt;
use metrics::{counter, histogram};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::application::routes::{Route, RouteAdapter, RouteError, RouteOutput};
use crate::domain::entities::{BlogPost, EditBlogPostRequest, PostId, User, UserId};
use crate::domain::posts::posts_for_user;

use super::config::CacheConfig;
use super::inflight::{FetchResult, InFlightQueries, SharedFetch};
use super::keys::{QueryKey, Tag, invalidated_tags};
use super::registry::TagRegistry;
use super::store::{CachedValue, QueryStore};

const METRIC_CACHE_HIT: &str = "postdeck_cache_hit_total";
const METRIC_CACHE_MISS: &str = "postdeck_cache_miss_total";
const METRIC_CACHE_DEDUP: &str = "postdeck_cache_dedup_total";
const METRIC_CACHE_INVALIDATED: &str = "postdeck_cache_invalidated_total";
const METRIC_QUERY_FETCH_MS: &str = "postdeck_query_fetch_ms";

/// A failed query, with the last data successfully fetched for it.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct QueryError<T> {
    pub error: RouteError,
    pub stale: Option<T>,
}

impl<T> QueryError<T> {
    pub fn new(error: RouteError) -> Self {
        Self { error, stale: None }
    }

    fn map_stale<U>(self, f: impl FnOnce(T) -> Option<U>) -> QueryError<U> {
        QueryError {
            error: self.error,
            stale: self.stale.and_then(f),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: CacheConfig,
    adapter: RouteAdapter,
    store: QueryStore,
    registry: TagRegistry,
    inflight: InFlightQueries,
}

impl ApiClient {
    pub fn new(config: CacheConfig, adapter: RouteAdapter) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                adapter,
                store: QueryStore::new(),
                registry: TagRegistry::new(),
                inflight: InFlightQueries::new(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub async fn users(&self) -> Result<Vec<User>, QueryError<Vec<User>>> {
        let key = QueryKey::Users;
        let value = self
            .query(key.clone())
            .await
            .map_err(|err| err.map_stale(CachedValue::into_users))?;
        expect_shape(value.into_users(), &key)
    }

    pub async fn blog_posts(&self) -> Result<Vec<BlogPost>, QueryError<Vec<BlogPost>>> {
        let key = QueryKey::BlogPosts;
        let value = self
            .query(key.clone())
            .await
            .map_err(|err| err.map_stale(CachedValue::into_blog_posts))?;
        expect_shape(value.into_blog_posts(), &key)
    }

    /// A single post by id. `Ok(None)` when the listing has no such post.
    pub async fn blog_post(
        &self,
        id: &str,
    ) -> Result<Option<BlogPost>, QueryError<Option<BlogPost>>> {
        let key = QueryKey::BlogPost(id.to_string());
        let value = self
            .query(key.clone())
            .await
            .map_err(|err| err.map_stale(CachedValue::into_blog_post))?;
        expect_shape(value.into_blog_post(), &key)
    }

    pub async fn posts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BlogPost>, QueryError<Vec<BlogPost>>> {
        match self.blog_posts().await {
            Ok(posts) => Ok(posts_for_user(&posts, user_id)),
            Err(err) => Err(err.map_stale(|posts| Some(posts_for_user(&posts, user_id)))),
        }
    }

    pub async fn delete_user(&self, id: UserId) -> Result<bool, RouteError> {
        match self.mutate(Route::DeleteUser(id)).await? {
            RouteOutput::Deleted(deleted) => Ok(deleted),
            other => Err(unexpected_output("delete_user", &other)),
        }
    }

    /// Create a post. When the backend acknowledges with an empty record the
    /// submitted post is returned.
    pub async fn add_blog_post(&self, post: BlogPost) -> Result<BlogPost, RouteError> {
        let submitted = post.clone();
        match self.mutate(Route::CreateBlogPost(post)).await? {
            RouteOutput::BlogPost(created) => Ok(created),
            RouteOutput::EmptyRecord => Ok(submitted),
            other => Err(unexpected_output("create_blog_post", &other)),
        }
    }

    /// Update a post. The returned post is also written into the cached post
    /// listing, which otherwise stays fresh across edits.
    pub async fn edit_blog_post(
        &self,
        request: EditBlogPostRequest,
    ) -> Result<BlogPost, RouteError> {
        let fallback = BlogPost {
            id: request.id.clone(),
            title: request.title.clone(),
            body: request.content.clone(),
            user_id: request.user_id,
            date_posted: request.date_posted.clone(),
        };
        let updated = match self.mutate(Route::UpdateBlogPost(request)).await? {
            RouteOutput::BlogPost(updated) => updated,
            RouteOutput::EmptyRecord => fallback,
            other => return Err(unexpected_output("update_blog_post", &other)),
        };

        // A listing fetched before the edit must not land as fresh.
        self.inner.inflight.mark_invalidated(&QueryKey::BlogPosts);
        if self.inner.store.replace_post(&updated) {
            debug!(post_id = %updated.id, "cached post listing patched");
        }
        Ok(updated)
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<bool, RouteError> {
        let id: PostId = id.to_string();
        let key = QueryKey::BlogPost(id.clone());
        match self.mutate(Route::DeleteBlogPost(id)).await? {
            RouteOutput::Deleted(deleted) => {
                self.inner.forget(&key);
                Ok(deleted)
            }
            other => Err(unexpected_output("delete_blog_post", &other)),
        }
    }

    /// Resolve a string-keyed request. Read-only routes go through the cache.
    pub async fn dispatch(
        &self,
        path: &str,
        method: &Method,
        body: Option<Value>,
    ) -> Result<Value, RouteError> {
        let route = Route::resolve(path, method, body)?;
        match QueryKey::for_route(&route) {
            Some(key) => {
                let value = self.query(key).await.map_err(|err| err.error)?;
                to_json(&value)
            }
            None => to_json(&self.mutate(route).await?),
        }
    }

    /// Serve `key` from the cache, or fetch it.
    ///
    /// A fresh entry is returned as is. Otherwise the query is fetched, joining
    /// a fetch already in flight for the same key. On failure the error carries
    /// the stale value, if there is one.
    pub async fn query(&self, key: QueryKey) -> Result<CachedValue, QueryError<CachedValue>> {
        if !self.inner.config.enabled {
            return self
                .inner
                .fetch(&key)
                .await
                .map_err(QueryError::new);
        }

        let cached = self.inner.store.get(&key);
        if let Some(entry) = cached.as_ref().filter(|entry| entry.fresh) {
            counter!(METRIC_CACHE_HIT, "query" => key.name()).increment(1);
            debug!(query = key.name(), "query served from cache");
            return Ok(entry.value.clone());
        }

        counter!(METRIC_CACHE_MISS, "query" => key.name()).increment(1);
        let stale = cached.map(|entry| entry.value);
        self.fetch_shared(key)
            .await
            .map_err(|error| QueryError { error, stale })
    }

    /// Execute a mutation. Tags are invalidated only when it succeeds.
    pub async fn mutate(&self, route: Route) -> Result<RouteOutput, RouteError> {
        let tags = invalidated_tags(&route);
        let output = self.inner.adapter.execute(route).await?;
        self.invalidate_tags(&tags);
        Ok(output)
    }

    /// Mark every entry that depends on one of `tags` stale, including fetches
    /// still in flight. Returns the number of stored entries marked.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }

        let keys = self.inner.registry.dependents(tags);
        let mut marked = 0;
        for key in &keys {
            self.inner.inflight.mark_invalidated(key);
            if self.inner.store.mark_stale(key) {
                marked += 1;
            }
        }

        counter!(METRIC_CACHE_INVALIDATED).increment(marked as u64);
        debug!(
            tags = ?tags.iter().map(ToString::to_string).collect::<Vec<_>>(),
            dependents = keys.len(),
            marked,
            "cache tags invalidated"
        );
        marked
    }

    /// Whether `key` has a fresh entry.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.inner
            .store
            .get(key)
            .is_some_and(|entry| entry.fresh)
    }

    /// Number of queries with a stored entry.
    pub fn cached_queries(&self) -> usize {
        self.inner.store.len()
    }

    /// Number of queries registered in the tag graph.
    pub fn tracked_queries(&self) -> usize {
        self.inner.registry.key_count()
    }

    /// Drop every cached entry and tag registration.
    pub fn reset(&self) {
        self.inner.store.clear();
        self.inner.registry.clear();
    }

    fn fetch_shared(&self, key: QueryKey) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        let (fetch, started) = self.inner.inflight.join_or_start(&key, |invalidated| {
            let task_key = key.clone();
            // Spawned so the fetch runs to completion even if every caller
            // stops waiting for it.
            let handle =
                tokio::spawn(async move { inner.run_fetch(task_key, invalidated).await });
            async move {
                handle.await.unwrap_or_else(|err| {
                    Err(RouteError::server(format!("query task failed: {err}")))
                })
            }
            .boxed()
        });

        if !started {
            counter!(METRIC_CACHE_DEDUP, "query" => key.name()).increment(1);
            debug!(query = key.name(), "joined in-flight query");
        }
        fetch
    }
}

impl ClientInner {
    async fn fetch(&self, key: &QueryKey) -> FetchResult {
        let started = Instant::now();
        let output = self.adapter.execute(key.route()).await;
        histogram!(METRIC_QUERY_FETCH_MS, "query" => key.name())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        CachedValue::from_output(key, output?)
    }

    fn forget(&self, key: &QueryKey) {
        self.store.remove(key);
        self.registry.unregister(key);
    }

    async fn run_fetch(&self, key: QueryKey, invalidated: Arc<AtomicBool>) -> FetchResult {
        self.registry.register(key.clone(), key.provided_tags());

        let result = self.fetch(&key).await;
        match &result {
            // Lookups of ids the listing lacks are not kept.
            Ok(CachedValue::BlogPost(None)) => {
                self.forget(&key);
                debug!(query = key.name(), "post not in listing; entry dropped");
            }
            Ok(value) => {
                let fresh = !invalidated.load(Ordering::SeqCst);
                self.store.put(key.clone(), value.clone(), fresh);
                // An invalidation may land between the load and the put.
                if fresh && invalidated.load(Ordering::SeqCst) {
                    self.store.mark_stale(&key);
                }
                if let CachedValue::BlogPosts(posts) = value {
                    for gone in self.store.prune_posts(posts) {
                        self.registry.unregister(&gone);
                    }
                }
                debug!(query = key.name(), fresh, "query result stored");
            }
            Err(err) => {
                debug!(query = key.name(), error = %err, "query failed; keeping last data");
            }
        }

        self.inflight.finish(&key);
        result
    }
}

fn expect_shape<T>(value: Option<T>, key: &QueryKey) -> Result<T, QueryError<T>> {
    value.ok_or_else(|| {
        QueryError::new(RouteError::server(format!(
            "cached value for query `{}` has the wrong shape",
            key.name()
        )))
    })
}

fn unexpected_output(route: &str, output: &RouteOutput) -> RouteError {
    RouteError::server(format!("unexpected response for `{route}`: {output:?}"))
}

fn to_json(value: &impl Serialize) -> Result<Value, RouteError> {
    serde_json::to_value(value).map_err(|err| RouteError::server(err.to_string()))
}
