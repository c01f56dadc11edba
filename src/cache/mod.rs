//! Tag-based query cache.
//!
//! Query results are cached per [`QueryKey`] and registered under the tags the
//! query provides. Mutations invalidate tags; every entry depending on an
//! invalidated tag is marked stale and refetched on its next read.
//!
//! ```toml
//! [cache]
//! enabled = true
//! ```

mod client;
mod config;
mod inflight;
mod keys;
mod lock;
mod registry;
mod store;

pub use client::{ApiClient, QueryError};
pub use config::CacheConfig;
pub use keys::{EntityKind, QueryKey, Tag, TagId, invalidated_tags};
pub use registry::TagRegistry;
pub use store::{CacheEntry, CachedValue, QueryStore};

pub(crate) use lock::mutex_lock;
