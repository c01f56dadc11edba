//! Tag dependency graph.
//!
//! Tracks which cache entries depend on which tags, in both directions, so an
//! invalidated tag can be traversed to the entries it must mark stale.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{QueryKey, Tag};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

#[derive(Default)]
struct Edges {
    tag_to_keys: HashMap<Tag, HashSet<QueryKey>>,
    key_to_tags: HashMap<QueryKey, HashSet<Tag>>,
}

/// Bidirectional `tag -> keys` / `key -> tags` mapping.
#[derive(Default)]
pub struct TagRegistry {
    edges: RwLock<Edges>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` as depending on `tags`, replacing any earlier registration.
    pub fn register(&self, key: QueryKey, tags: impl IntoIterator<Item = Tag>) {
        let mut edges = rw_write(&self.edges, SOURCE, "register");
        remove_key(&mut edges, &key);

        let tags: HashSet<Tag> = tags.into_iter().collect();
        for tag in &tags {
            edges
                .tag_to_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        edges.key_to_tags.insert(key, tags);
    }

    /// Every key that depends on `tag`.
    pub fn keys_for_tag(&self, tag: &Tag) -> HashSet<QueryKey> {
        rw_read(&self.edges, SOURCE, "keys_for_tag")
            .tag_to_keys
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    /// Every key that depends on at least one of `tags`.
    pub fn dependents(&self, tags: &[Tag]) -> HashSet<QueryKey> {
        let edges = rw_read(&self.edges, SOURCE, "dependents");
        tags.iter()
            .filter_map(|tag| edges.tag_to_keys.get(tag))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn tags_for_key(&self, key: &QueryKey) -> HashSet<Tag> {
        rw_read(&self.edges, SOURCE, "tags_for_key")
            .key_to_tags
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn unregister(&self, key: &QueryKey) {
        let mut edges = rw_write(&self.edges, SOURCE, "unregister");
        remove_key(&mut edges, key);
    }

    pub fn clear(&self) {
        let mut edges = rw_write(&self.edges, SOURCE, "clear");
        edges.tag_to_keys.clear();
        edges.key_to_tags.clear();
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.edges, SOURCE, "tag_count").tag_to_keys.len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.edges, SOURCE, "key_count").key_to_tags.len()
    }
}

fn remove_key(edges: &mut Edges, key: &QueryKey) {
    let Some(tags) = edges.key_to_tags.remove(key) else {
        return;
    };
    for tag in tags {
        if let Some(keys) = edges.tag_to_keys.get_mut(&tag) {
            keys.remove(key);
            if keys.is_empty() {
                edges.tag_to_keys.remove(&tag);
            }
        }
    }
}
