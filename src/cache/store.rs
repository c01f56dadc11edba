//! Cache entry storage.
//!
//! Each entry keeps the last known good value for a query plus a freshness
//! flag. Invalidation only flips the flag; the value stays available so a
//! failed refetch can still hand back what was shown before.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::application::routes::{RouteError, RouteOutput};
use crate::domain::entities::{BlogPost, User};

use super::keys::QueryKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Value held by a cache entry, shaped by the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CachedValue {
    Users(Vec<User>),
    BlogPosts(Vec<BlogPost>),
    BlogPost(Option<BlogPost>),
}

impl CachedValue {
    /// Shape a route result for `key`. A result of the wrong shape is a server error.
    pub fn from_output(key: &QueryKey, output: RouteOutput) -> Result<Self, RouteError> {
        match (key, output) {
            (QueryKey::Users, RouteOutput::Users(users)) => Ok(CachedValue::Users(users)),
            (QueryKey::BlogPosts, RouteOutput::BlogPosts(posts)) => {
                Ok(CachedValue::BlogPosts(posts))
            }
            (QueryKey::BlogPost(id), RouteOutput::BlogPosts(posts)) => Ok(CachedValue::BlogPost(
                posts.into_iter().find(|post| &post.id == id),
            )),
            (key, other) => Err(RouteError::server(format!(
                "unexpected response shape for query `{}`: {other:?}",
                key.name()
            ))),
        }
    }

    pub fn into_users(self) -> Option<Vec<User>> {
        match self {
            CachedValue::Users(users) => Some(users),
            _ => None,
        }
    }

    pub fn into_blog_posts(self) -> Option<Vec<BlogPost>> {
        match self {
            CachedValue::BlogPosts(posts) => Some(posts),
            _ => None,
        }
    }

    pub fn into_blog_post(self) -> Option<Option<BlogPost>> {
        match self {
            CachedValue::BlogPost(post) => Some(post),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub fresh: bool,
}

#[derive(Default)]
pub struct QueryStore {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        rw_read(&self.entries, SOURCE, "get").get(key).cloned()
    }

    /// Replace the entry for `key`.
    pub fn put(&self, key: QueryKey, value: CachedValue, fresh: bool) {
        rw_write(&self.entries, SOURCE, "put").insert(key, CacheEntry { value, fresh });
    }

    /// Swap `post` into the cached post listing, matched by id. Freshness is
    /// left as it was. Returns false when no cached listing holds the post.
    pub fn replace_post(&self, post: &BlogPost) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "replace_post");
        let Some(CacheEntry {
            value: CachedValue::BlogPosts(posts),
            ..
        }) = entries.get_mut(&QueryKey::BlogPosts)
        else {
            return false;
        };
        match posts.iter_mut().find(|cached| cached.id == post.id) {
            Some(slot) => {
                *slot = post.clone();
                true
            }
            None => false,
        }
    }

    /// Mark an entry stale. Returns false when there is no fresh entry to mark.
    pub fn mark_stale(&self, key: &QueryKey) -> bool {
        match rw_write(&self.entries, SOURCE, "mark_stale").get_mut(key) {
            Some(entry) if entry.fresh => {
                entry.fresh = false;
                true
            }
            _ => false,
        }
    }

    /// Drop single-post entries for posts missing from `listing`. Returns the
    /// keys removed.
    pub fn prune_posts(&self, listing: &[BlogPost]) -> Vec<QueryKey> {
        let mut entries = rw_write(&self.entries, SOURCE, "prune_posts");
        let gone: Vec<QueryKey> = entries
            .keys()
            .filter(|key| match key {
                QueryKey::BlogPost(id) => !listing.iter().any(|post| &post.id == id),
                _ => false,
            })
            .cloned()
            .collect();
        for key in &gone {
            entries.remove(key);
        }
        gone
    }

    pub fn remove(&self, key: &QueryKey) -> Option<CacheEntry> {
        rw_write(&self.entries, SOURCE, "remove").remove(key)
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
