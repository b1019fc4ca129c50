use std::sync::Arc;

use async_trait::async_trait;
use relaybox_core::CacheKey;

use crate::{CachedEntry, EntryHandle, EntryMeta, StoreError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared storage for cached responses.
///
/// A store is shared by every exchange, so all operations take `&self` and
/// implementations must be safe to call concurrently. The engine relies on
/// these guarantees:
///
/// - [`exists`](Store::exists) only reports entries that are complete and
///   not expired.
/// - [`create`](Store::create) hands out at most one live handle per key.
///   A second creator gets [`StoreError::Conflict`].
/// - [`append`](Store::append) may accept fewer bytes than offered. A short
///   count means the entry can no longer be completed.
#[async_trait]
pub trait Store: Send + Sync {
    /// Looks up a complete entry by key.
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>>;

    /// Opens a new entry in `CREATING` state.
    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle>;

    /// Appends body bytes to a `CREATING` entry, returning how many bytes
    /// were accepted.
    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize>;

    /// Marks the entry complete and servable.
    async fn finish(&self, handle: EntryHandle) -> StoreResult<()>;

    /// Discards a `CREATING` entry.
    async fn abort(&self, handle: EntryHandle) -> StoreResult<()>;

    /// Removes up to `budget` expired or abandoned entries, returning how
    /// many were removed.
    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize>;

    /// Returns the name of this store, used in logs and metric labels.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for &S {
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>> {
        (**self).exists(key).await
    }

    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle> {
        (**self).create(key, meta).await
    }

    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize> {
        (**self).append(handle, data).await
    }

    async fn finish(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).finish(handle).await
    }

    async fn abort(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).abort(handle).await
    }

    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize> {
        (**self).sweep_expired(budget).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Box<S> {
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>> {
        (**self).exists(key).await
    }

    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle> {
        (**self).create(key, meta).await
    }

    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize> {
        (**self).append(handle, data).await
    }

    async fn finish(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).finish(handle).await
    }

    async fn abort(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).abort(handle).await
    }

    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize> {
        (**self).sweep_expired(budget).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn exists(&self, key: &CacheKey) -> StoreResult<Option<CachedEntry>> {
        (**self).exists(key).await
    }

    async fn create(&self, key: &CacheKey, meta: EntryMeta) -> StoreResult<EntryHandle> {
        (**self).create(key, meta).await
    }

    async fn append(&self, handle: &EntryHandle, data: &[u8]) -> StoreResult<usize> {
        (**self).append(handle, data).await
    }

    async fn finish(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).finish(handle).await
    }

    async fn abort(&self, handle: EntryHandle) -> StoreResult<()> {
        (**self).abort(handle).await
    }

    async fn sweep_expired(&self, budget: usize) -> StoreResult<usize> {
        (**self).sweep_expired(budget).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
