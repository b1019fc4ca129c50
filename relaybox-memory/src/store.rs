//! Memory store implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use relaybox_core::CacheKey;
use relaybox_store::{CachedEntry, EntryHandle, EntryMeta, Store, StoreError, StoreResult};
use smol_str::SmolStr;
use tracing::debug;

use crate::builder::MemoryStoreBuilder;
use crate::metrics;

#[derive(Debug)]
pub(crate) struct Pending {
    id: u64,
    meta: EntryMeta,
    body: BytesMut,
    started: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) complete: DashMap<CacheKey, CachedEntry>,
    pub(crate) creating: DashMap<CacheKey, Pending>,
    pub(crate) next_id: AtomicU64,
    pub(crate) max_entry_bytes: Option<usize>,
    pub(crate) creating_timeout: Duration,
    pub(crate) label: SmolStr,
}

/// In-memory store.
///
/// Cloning is cheap and clones share the same maps.
///
/// ```
/// use relaybox_memory::MemoryStore;
/// use std::time::Duration;
///
/// let store = MemoryStore::builder()
///     .label("edge")
///     .max_entry_bytes(1024 * 1024)
///     .creating_timeout(Duration::from_secs(30))
///     .build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted** and is lost on restart
/// - There is no capacity bound besides the per-entry limit; expired
///   entries are only removed by lookups and by `sweep_expired`
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub(crate) inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates a store with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::new()
    }

    /// Number of complete entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.complete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.complete.is_empty()
    }

    /// Number of entries being created.
    pub fn creating_len(&self) -> usize {
        self.inner.creating.len()
    }

    /// Returns `true` if an entry for `key` is being created.
    pub fn is_creating(&self, key: &CacheKey) -> bool {
        self.inner.creating.contains_key(key)
    }

    fn record_occupancy(&self) {
        metrics::record_occupancy(&self.inner.label, self.len(), self.creating_len());
    }

    fn is_stale(&self, pending: &Pending, now: DateTime<Utc>) -> bool {
        TimeDelta::from_std(self.inner.creating_timeout)
            .ok()
            .and_then(|timeout| pending.started.checked_add_signed(timeout))
            .is_some_and(|deadline| deadline <= now)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>> {
        let now = Utc::now();
        let found = self.inner.complete.get(key).map(|entry| entry.value().clone());
        match found {
            Some(entry) if entry.is_expired(now) => {
                self.inner
                    .complete
                    .remove_if(key, |_, entry| entry.is_expired(now));
                Ok(None)
            }
            found => Ok(found),
        }
    }

    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        match self.inner.creating.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                key: key.to_string(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(Pending {
                    id,
                    meta,
                    body: BytesMut::new(),
                    started: Utc::now(),
                });
                Ok(EntryHandle::new(key.clone(), id))
            }
        }
    }

    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize> {
        let mut pending = self
            .inner
            .creating
            .get_mut(handle.key())
            .filter(|pending| pending.id == handle.id())
            .ok_or_else(|| StoreError::NotFound {
                key: handle.key().to_string(),
            })?;

        let accepted = match self.inner.max_entry_bytes {
            Some(limit) => {
                let room = limit.saturating_sub(pending.body.len());
                if room == 0 && !data.is_empty() {
                    return Err(StoreError::EntryTooLarge { limit });
                }
                room.min(data.len())
            }
            None => data.len(),
        };
        pending.body.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    async fn finish(&self, handle: EntryHandle) -> StoreResult<()> {
        let (key, pending) = self
            .inner
            .creating
            .remove_if(handle.key(), |_, pending| pending.id == handle.id())
            .ok_or_else(|| StoreError::NotFound {
                key: handle.key().to_string(),
            })?;
        let entry = CachedEntry::new(key.clone(), pending.meta, pending.body.freeze(), Utc::now());
        self.inner.complete.insert(key, entry);
        self.record_occupancy();
        Ok(())
    }

    async fn abort(&self, handle: EntryHandle) -> StoreResult<()> {
        if self
            .inner
            .creating
            .remove_if(handle.key(), |_, pending| pending.id == handle.id())
            .is_some()
        {
            self.record_occupancy();
        }
        Ok(())
    }

    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize> {
        let now = Utc::now();

        let expired: Vec<CacheKey> = self
            .inner
            .complete
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .take(budget)
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for key in expired {
            if self
                .inner
                .complete
                .remove_if(&key, |_, entry| entry.is_expired(now))
                .is_some()
            {
                removed += 1;
            }
        }

        let stale: Vec<(CacheKey, u64)> = self
            .inner
            .creating
            .iter()
            .filter(|pending| self.is_stale(pending.value(), now))
            .take(budget.saturating_sub(removed))
            .map(|pending| (pending.key().clone(), pending.value().id))
            .collect();
        for (key, id) in stale {
            if self
                .inner
                .creating
                .remove_if(&key, |_, pending| pending.id == id)
                .is_some()
            {
                debug!(key = key.as_str(), "removed stale entry in creation");
                removed += 1;
            }
        }

        if removed > 0 {
            self.record_occupancy();
        }
        Ok(removed)
    }

    fn name(&self) -> &str {
        &self.inner.label
    }
}
