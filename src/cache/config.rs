//! Cache configuration.

use serde::Deserialize;

/// Query cache settings, read from the `[cache]` table of `postdeck.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve queries from the cache and deduplicate in-flight fetches.
    ///
    /// When off, every query goes straight to the route adapter.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
        }
    }
}
