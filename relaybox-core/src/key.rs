//! Cache key types and construction.
//!
//! This module provides types for building and representing cache keys:
//!
//! - [`CacheKey`] - An owned key string together with its 64-bit hash
//! - [`KeyPart`] - A single name/value component of a cache key
//! - [`KeyParts`] - Builder for accumulating key parts
//!
//! ## Format
//!
//! Keys are rendered from their parts as `name1=value1&name2=value2`.
//! A part without a value renders as its bare name. A `&`, `=` or `\`
//! inside a name or value is escaped with a backslash, so distinct parts
//! never render to the same key.
//!
//! ```
//! use relaybox_core::{CacheKey, KeyPart, KeyParts};
//!
//! let mut parts = KeyParts::new();
//! parts.push(KeyPart::new("method", Some("GET")));
//! parts.push(KeyPart::new("path", Some("/a")));
//! let key = parts.into_cache_key();
//!
//! assert_eq!(key.as_str(), "method=GET&path=/a");
//! assert_eq!(key, CacheKey::new("method=GET&path=/a"));
//! ```
//!
//! ## Hashing
//!
//! The hash is the first eight bytes of the SHA-256 digest of the key
//! string, read big-endian. It is a pure function of the key string, so
//! identical request attributes always produce identical `(key, hash)` pairs
//! across exchanges and processes.

use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use smol_str::SmolStr;

/// Computes the 64-bit hash of a key string.
pub fn hash_key(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[derive(Debug, Eq, PartialEq)]
struct CacheKeyInner {
    hash: u64,
    key: String,
}

/// A cache key identifying a store entry.
///
/// The key string is owned: it outlives the request buffer it was built
/// from. `CacheKey` wraps its data in [`Arc`], so a clone kept in the stash
/// and a clone handed to the store share one allocation.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    /// Creates a key from its string form, computing the hash.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let hash = hash_key(&key);
        Self {
            inner: Arc::new(CacheKeyInner { hash, key }),
        }
    }

    /// Returns the key string.
    pub fn as_str(&self) -> &str {
        &self.inner.key
    }

    /// Returns the 64-bit hash of the key string.
    pub fn hash(&self) -> u64 {
        self.inner.hash
    }

    /// Returns the key length in bytes.
    pub fn len(&self) -> usize {
        self.inner.key.len()
    }

    /// Returns `true` when the key string is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.key.is_empty()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.hash == other.inner.hash && self.inner.key == other.inner.key)
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::new(key)
    }
}

/// A single component of a cache key.
///
/// Both name and value use [`SmolStr`], which stores short strings inline.
/// Typical components such as `method=GET` never touch the heap.
///
/// ```
/// use relaybox_core::KeyPart;
///
/// let method = KeyPart::new("method", Some("GET"));
/// assert_eq!(method.to_string(), "method=GET");
///
/// let flag = KeyPart::new("delimiter", None::<&str>);
/// assert_eq!(flag.to_string(), "delimiter");
///
/// let query = KeyPart::new("query", Some("a=1&b=2"));
/// assert_eq!(query.to_string(), r"query=a\=1\&b\=2");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct KeyPart {
    key: SmolStr,
    value: Option<SmolStr>,
}

impl KeyPart {
    /// Creates a new key part.
    pub fn new<K: AsRef<str>, V: AsRef<str>>(key: K, value: Option<V>) -> Self {
        KeyPart {
            key: SmolStr::new(key),
            value: value.map(SmolStr::new),
        }
    }

    /// Returns the part name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the optional value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let mut rest = text;
    while let Some(at) = rest.find(['&', '=', '\\']) {
        f.write_str(&rest[..at])?;
        f.write_char('\\')?;
        let special = &rest[at..at + 1];
        f.write_str(special)?;
        rest = &rest[at + 1..];
    }
    f.write_str(rest)
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.key)?;
        if let Some(ref value) = self.value {
            f.write_char('=')?;
            write_escaped(f, value)?;
        }
        Ok(())
    }
}

/// Builder for accumulating cache key parts.
///
/// Parts are rendered in insertion order, so the order of components in a
/// key template is significant.
#[derive(Debug, Default, Clone)]
pub struct KeyParts {
    parts: Vec<KeyPart>,
}

impl KeyParts {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single key part.
    pub fn push(&mut self, part: KeyPart) {
        self.parts.push(part)
    }

    /// Appends multiple key parts from a vector.
    pub fn append(&mut self, parts: &mut Vec<KeyPart>) {
        self.parts.append(parts)
    }

    /// Returns an iterator over the accumulated parts.
    pub fn iter(&self) -> impl Iterator<Item = &KeyPart> {
        self.parts.iter()
    }

    /// Consumes the builder and renders the final key.
    pub fn into_cache_key(self) -> CacheKey {
        let mut rendered = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                rendered.push('&');
            }
            rendered.push_str(&part.to_string());
        }
        CacheKey::new(rendered)
    }
}
