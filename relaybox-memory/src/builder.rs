//! Builder for configuring [`MemoryStore`].

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use dashmap::DashMap;
use smol_str::SmolStr;

use crate::store::{Inner, MemoryStore};

/// Builder for creating and configuring a [`MemoryStore`].
///
/// Use [`MemoryStore::builder`] to create a new builder instance.
#[derive(Debug, Clone)]
pub struct MemoryStoreBuilder {
    label: SmolStr,
    max_entry_bytes: Option<usize>,
    creating_timeout: Duration,
}

impl MemoryStoreBuilder {
    /// Default age after which an entry still being created is swept.
    pub const DEFAULT_CREATING_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Self {
        Self {
            label: SmolStr::new_static("memory"),
            max_entry_bytes: None,
            creating_timeout: Self::DEFAULT_CREATING_TIMEOUT,
        }
    }

    /// Sets the store name used in logs and metric labels.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Limits the body size of a single entry. Appends beyond the limit
    /// are cut short.
    pub fn max_entry_bytes(mut self, limit: usize) -> Self {
        self.max_entry_bytes = Some(limit);
        self
    }

    /// Sets the age after which an entry still being created is considered
    /// abandoned and removed by a sweep.
    ///
    /// This is the only cleanup for a capture whose exchange never reached
    /// `CacheEngine::detach` in `relaybox`, for example when
    /// the exchange future was dropped. Until the entry is swept, every
    /// other exchange for its key gets a conflict on `create` and is served
    /// uncached.
    pub fn creating_timeout(mut self, timeout: Duration) -> Self {
        self.creating_timeout = timeout;
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore {
            inner: Arc::new(Inner {
                complete: DashMap::new(),
                creating: DashMap::new(),
                next_id: AtomicU64::new(1),
                max_entry_bytes: self.max_entry_bytes,
                creating_timeout: self.creating_timeout,
                label: self.label,
            }),
        }
    }
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
