#![warn(missing_docs)]
//! # relaybox-core
//!
//! Core traits and types for the relaybox response cache.
//!
//! This crate holds the protocol-agnostic building blocks that the
//! decision engine in `relaybox` is assembled from:
//!
//! - **Decide** whether a rule applies to a request or response ([`Predicate`])
//! - **Identify** cached entries by key string and 64-bit hash ([`CacheKey`])
//! - **Assemble** keys from request components ([`KeyParts`])
//! - **Attribute** store entries to the proxy that created them ([`ProxyId`])
//!
//! HTTP-specific predicates and key templates live in `relaybox-http`.

pub mod key;
pub mod predicate;
pub mod proxy;

pub use key::{CacheKey, KeyPart, KeyParts, hash_key};
pub use predicate::{And, Neutral, Not, Or, Predicate, PredicateExt, PredicateResult};
pub use proxy::ProxyId;
#[doc(hidden)]
pub use smol_str::SmolStr;
