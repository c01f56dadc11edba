//! Persisted pagination state for admin tables.
//!
//! Each table owns a storage key. `current` and `page_size` are loaded from and
//! saved to a [`PaginationStorage`] under that key; `total` always comes from
//! the live dataset.

use std::num::NonZeroU32;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use postdeck_api_types::PaginationSnapshot;

pub const DEFAULT_STORAGE_KEY: &str = "table-pagination";
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();
pub const DEFAULT_PAGE_SIZE_OPTIONS: [&str; 4] = ["10", "20", "50", "100"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage contents are not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Key/value persistence for pagination snapshots.
pub trait PaginationStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    pub default_page_size: NonZeroU32,
    /// Allowed page sizes, in display order.
    pub page_size_options: Vec<String>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS
                .iter()
                .map(|option| option.to_string())
                .collect(),
        }
    }
}

impl PaginationOptions {
    pub fn allows(&self, page_size: NonZeroU32) -> bool {
        self.page_size_options
            .iter()
            .any(|option| option.trim().parse::<u32>() == Ok(page_size.get()))
    }
}

impl From<&crate::config::PaginationSettings> for PaginationOptions {
    fn from(settings: &crate::config::PaginationSettings) -> Self {
        Self {
            default_page_size: settings.default_page_size,
            page_size_options: settings.page_size_options.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current: NonZeroU32,
    pub page_size: NonZeroU32,
    pub total: usize,
}

pub struct PaginationStore {
    storage: Arc<dyn PaginationStorage>,
    key: String,
    options: PaginationOptions,
    state: PaginationState,
}

impl PaginationStore {
    /// Restore the table state saved under `key`, with `total` taken from the
    /// dataset length. Missing or malformed saved state falls back to page 1
    /// at the default page size. So does a saved page size that is not an
    /// allowed option, since the saved page number meant a different slice.
    pub fn new(
        storage: Arc<dyn PaginationStorage>,
        key: impl Into<String>,
        options: PaginationOptions,
        total: usize,
    ) -> Self {
        let key = key.into();
        let (current, page_size) = match load_snapshot(storage.as_ref(), &key) {
            Some(snapshot) if options.allows(snapshot.page_size) => {
                (snapshot.current, snapshot.page_size)
            }
            Some(snapshot) => {
                warn!(
                    storage_key = %key,
                    page_size = snapshot.page_size.get(),
                    "saved page size is not an allowed option; using the default"
                );
                (NonZeroU32::MIN, options.default_page_size)
            }
            None => (NonZeroU32::MIN, options.default_page_size),
        };

        Self {
            storage,
            key,
            state: PaginationState {
                current,
                page_size,
                total,
            },
            options,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// Track a new dataset length. Page and page size are left alone.
    pub fn sync_total(&mut self, total: usize) {
        self.state.total = total;
    }

    /// Apply a pagination change and persist `{current, pageSize}`.
    ///
    /// Values are taken as given. A storage failure is logged and the in-memory
    /// state still changes.
    pub fn change(&mut self, current: NonZeroU32, page_size: NonZeroU32) {
        self.state.current = current;
        self.state.page_size = page_size;

        let snapshot = PaginationSnapshot { current, page_size };
        let result = serde_json::to_string(&snapshot)
            .map_err(StorageError::from)
            .and_then(|raw| self.storage.save(&self.key, &raw));
        match result {
            Ok(()) => debug!(
                storage_key = %self.key,
                current = current.get(),
                page_size = page_size.get(),
                "pagination state saved"
            ),
            Err(err) => warn!(
                storage_key = %self.key,
                error = %err,
                "failed to save pagination state"
            ),
        }
    }

    /// Number of pages needed for `total` items. Zero for an empty dataset.
    pub fn page_count(&self) -> u32 {
        let pages = self.state.total.div_ceil(self.state.page_size.get() as usize);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// The items on the current page. Empty when the page is past the end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let size = self.state.page_size.get() as usize;
        let start = (self.state.current.get() as usize - 1).saturating_mul(size);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(size).min(items.len());
        &items[start..end]
    }
}

fn load_snapshot(storage: &dyn PaginationStorage, key: &str) -> Option<PaginationSnapshot> {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(storage_key = %key, error = %err, "failed to load pagination state");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(storage_key = %key, error = %err, "ignoring malformed pagination state");
            None
        }
    }
}
