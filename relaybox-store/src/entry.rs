//! Store entry types.
//!
//! - [`EntryHandle`] - exclusive write capability for a `CREATING` entry
//! - [`EntryMeta`] - what the engine knows when it opens an entry
//! - [`ResponseHead`] - status line and headers of the captured response
//! - [`CachedEntry`] - a complete, servable entry returned by lookups

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use http::{HeaderMap, Response, StatusCode, Version, response};
use relaybox_core::{CacheKey, ProxyId};

/// Status line and headers of a captured response.
///
/// Recorded when the engine opens a store entry, so the header bytes of the
/// forwarded stream are never mirrored into the body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHead {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
}

impl ResponseHead {
    /// Creates a new response head.
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap) -> Self {
        Self {
            status,
            version,
            headers,
        }
    }

    /// Returns the response status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the HTTP version of the response.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl From<&response::Parts> for ResponseHead {
    fn from(parts: &response::Parts) -> Self {
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }
}

/// Metadata supplied by the engine when it opens a store entry.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Proxy whose rule created the entry.
    pub proxy: ProxyId,
    /// Time-to-live once the entry is complete. `None` never expires.
    pub ttl: Option<Duration>,
    /// Captured response head.
    pub head: ResponseHead,
}

/// Exclusive handle to an entry in `CREATING` state.
///
/// Only the store constructs handles. The handle is deliberately not
/// `Clone`: [`Store::finish`](crate::Store::finish) and
/// [`Store::abort`](crate::Store::abort) consume it.
#[derive(Debug, PartialEq, Eq)]
pub struct EntryHandle {
    key: CacheKey,
    id: u64,
}

impl EntryHandle {
    /// Creates a handle for the entry `id` being created under `key`.
    pub fn new(key: CacheKey, id: u64) -> Self {
        Self { key, id }
    }

    /// Returns the entry key.
    #[inline]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns the store-assigned id of this creation attempt.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A complete entry, as returned by [`Store::exists`](crate::Store::exists).
///
/// Cloning is cheap: the head is shared and the body is reference counted.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    key: CacheKey,
    proxy: ProxyId,
    head: Arc<ResponseHead>,
    body: Bytes,
    created: DateTime<Utc>,
    expire: Option<DateTime<Utc>>,
}

impl CachedEntry {
    /// Assembles a complete entry from the metadata given at creation time
    /// and the captured body.
    pub fn new(key: CacheKey, meta: EntryMeta, body: Bytes, created: DateTime<Utc>) -> Self {
        let expire = meta
            .ttl
            .and_then(|ttl| TimeDelta::from_std(ttl).ok())
            .and_then(|ttl| created.checked_add_signed(ttl));
        Self {
            key,
            proxy: meta.proxy,
            head: Arc::new(meta.head),
            body,
            created,
            expire,
        }
    }

    /// Returns the entry key.
    #[inline]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns the proxy that created the entry.
    #[inline]
    pub fn proxy(&self) -> &ProxyId {
        &self.proxy
    }

    /// Returns the captured response head.
    #[inline]
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Returns the captured body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns when the entry was completed.
    #[inline]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns when the entry expires.
    #[inline]
    pub fn expire(&self) -> Option<DateTime<Utc>> {
        self.expire
    }

    /// Returns `true` if the entry has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire.is_some_and(|expire| expire <= now)
    }

    /// Returns the remaining time-to-live, or `None` if the entry never
    /// expires. An expired entry reports zero.
    pub fn ttl(&self) -> Option<Duration> {
        self.expire
            .map(|expire| (expire - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Rebuilds an HTTP response from the entry, for serving a hit.
    pub fn to_response(&self) -> Response<Bytes> {
        let mut response = Response::new(self.body.clone());
        *response.status_mut() = self.head.status;
        *response.version_mut() = self.head.version;
        *response.headers_mut() = self.head.headers.clone();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(ttl: Option<Duration>) -> EntryMeta {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "text/plain".parse().unwrap());
        EntryMeta {
            proxy: ProxyId::new(1, "web"),
            ttl,
            head: ResponseHead::new(StatusCode::OK, Version::HTTP_11, headers),
        }
    }

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CachedEntry::new(
            CacheKey::new("path=/a"),
            meta(None),
            Bytes::from_static(b"hello"),
            Utc::now(),
        );
        assert_eq!(entry.expire(), None);
        assert!(!entry.is_expired(Utc::now() + TimeDelta::days(365)));
        assert_eq!(entry.ttl(), None);
    }

    #[test]
    fn test_entry_with_ttl_expires() {
        let created = Utc::now();
        let entry = CachedEntry::new(
            CacheKey::new("path=/a"),
            meta(Some(Duration::from_secs(10))),
            Bytes::new(),
            created,
        );
        assert_eq!(entry.expire(), Some(created + TimeDelta::seconds(10)));
        assert!(!entry.is_expired(created + TimeDelta::seconds(9)));
        assert!(entry.is_expired(created + TimeDelta::seconds(10)));
    }

    #[test]
    fn test_to_response_restores_head_and_body() {
        let entry = CachedEntry::new(
            CacheKey::new("path=/a"),
            meta(None),
            Bytes::from_static(b"hello"),
            Utc::now(),
        );
        let response = entry.to_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(response.body().as_ref(), b"hello");
    }
}
