use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use relaybox_core::CacheKey;
use relaybox_memory::MemoryStore;
use relaybox_store::{CachedEntry, EntryHandle, EntryMeta, Store, StoreError, StoreResult};

const NO_LIMIT: usize = usize::MAX;

#[derive(Debug, Default)]
pub struct StoreCounters {
    pub exists_count: AtomicUsize,
    pub create_count: AtomicUsize,
    pub append_count: AtomicUsize,
    pub finish_count: AtomicUsize,
    pub abort_count: AtomicUsize,
    pub sweep_count: AtomicUsize,
}

impl StoreCounters {
    pub fn exists_count(&self) -> usize {
        self.exists_count.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn append_count(&self) -> usize {
        self.append_count.load(Ordering::SeqCst)
    }

    pub fn finish_count(&self) -> usize {
        self.finish_count.load(Ordering::SeqCst)
    }

    pub fn abort_count(&self) -> usize {
        self.abort_count.load(Ordering::SeqCst)
    }

    pub fn sweep_count(&self) -> usize {
        self.sweep_count.load(Ordering::SeqCst)
    }

    /// Looks a counter up by operation name.
    pub fn get(&self, operation: &str) -> Option<usize> {
        let count = match operation {
            "exists" => self.exists_count(),
            "create" => self.create_count(),
            "append" => self.append_count(),
            "finish" => self.finish_count(),
            "abort" => self.abort_count(),
            "sweep" => self.sweep_count(),
            _ => return None,
        };
        Some(count)
    }

    pub fn reset(&self) {
        self.exists_count.store(0, Ordering::SeqCst);
        self.create_count.store(0, Ordering::SeqCst);
        self.append_count.store(0, Ordering::SeqCst);
        self.finish_count.store(0, Ordering::SeqCst);
        self.abort_count.store(0, Ordering::SeqCst);
        self.sweep_count.store(0, Ordering::SeqCst);
    }
}

/// Injected store failures.
#[derive(Debug)]
pub struct Faults {
    fail_create: AtomicBool,
    write_limit: AtomicUsize,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            fail_create: AtomicBool::new(false),
            write_limit: AtomicUsize::new(NO_LIMIT),
        }
    }
}

/// Store that counts calls and can be told to misbehave.
///
/// Entries are kept in a [`MemoryStore`].
#[derive(Clone, Debug)]
pub struct MockStore {
    pub inner: MemoryStore,
    pub counters: Arc<StoreCounters>,
    faults: Arc<Faults>,
    written: Arc<DashMap<u64, usize>>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            counters: Arc::new(StoreCounters::default()),
            faults: Arc::new(Faults::default()),
            written: Arc::new(DashMap::new()),
        }
    }

    /// Every `create` fails with an internal error.
    pub fn fail_create(&self, fail: bool) {
        self.faults.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Each entry accepts at most `limit` body bytes; further appends are
    /// cut short.
    pub fn short_write_after(&self, limit: usize) {
        self.faults.write_limit.store(limit, Ordering::SeqCst);
    }

    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    pub fn entry_count(&self) -> usize {
        self.inner.len()
    }

    pub fn creating_count(&self) -> usize {
        self.inner.creating_len()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>> {
        self.counters.exists_count.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle> {
        self.counters.create_count.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("injected create failure".into()));
        }
        self.inner.create(key, meta).await
    }

    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize> {
        self.counters.append_count.fetch_add(1, Ordering::SeqCst);
        let limit = self.faults.write_limit.load(Ordering::SeqCst);
        let written = self.written.get(&handle.id()).map_or(0, |entry| *entry);
        let room = limit.saturating_sub(written).min(data.len());
        let accepted = self.inner.append(handle, &data[..room]).await?;
        *self.written.entry(handle.id()).or_insert(0) += accepted;
        Ok(accepted)
    }

    async fn finish(&self, handle: EntryHandle) -> StoreResult<()> {
        self.counters.finish_count.fetch_add(1, Ordering::SeqCst);
        self.written.remove(&handle.id());
        self.inner.finish(handle).await
    }

    async fn abort(&self, handle: EntryHandle) -> StoreResult<()> {
        self.counters.abort_count.fetch_add(1, Ordering::SeqCst);
        self.written.remove(&handle.id());
        self.inner.abort(handle).await
    }

    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize> {
        self.counters.sweep_count.fetch_add(1, Ordering::SeqCst);
        self.inner.sweep_expired(budget).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use http::{HeaderMap, StatusCode, Version};
    use relaybox_core::ProxyId;
    use relaybox_store::ResponseHead;

    fn meta() -> EntryMeta {
        EntryMeta {
            proxy: ProxyId::default(),
            ttl: None,
            head: ResponseHead::new(StatusCode::OK, Version::HTTP_11, HeaderMap::new()),
        }
    }

    #[tokio::test]
    async fn test_short_write_after_limit() {
        let store = MockStore::new();
        store.short_write_after(5);
        let handle = store.create(&CacheKey::new("k"), meta()).await.unwrap();

        assert_eq!(store.append(&handle, b"abc").await.unwrap(), 3);
        assert_eq!(store.append(&handle, b"defg").await.unwrap(), 2);
        assert_eq!(store.append(&handle, b"h").await.unwrap(), 0);
        assert_eq!(store.counters().append_count(), 3);
    }

    #[tokio::test]
    async fn test_injected_create_failure() {
        let store = MockStore::new();
        store.fail_create(true);
        let result = store.create(&CacheKey::new("k"), meta()).await;

        assert!(matches!(result, Err(StoreError::Internal(_))));
        assert_eq!(store.counters().get("create"), Some(1));
        assert_eq!(store.creating_count(), 0);
    }
}
