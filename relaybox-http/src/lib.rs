//! # relaybox-http
//!
//! HTTP building blocks for the relaybox decision engine.
//!
//! - [`RequestMeta`] - owned snapshot of the request attributes that outlive
//!   the request buffer
//! - [`KeyTemplate`] - builds a [`CacheKey`](relaybox_core::CacheKey) from a
//!   request snapshot
//! - [`StatusCodes`] - a rule's accepted response status codes
//! - [`predicates`] - request and response predicates for rule conditions
//! - [`is_cacheable_method`] - request method classification

pub mod key;
mod meta;
mod method;
pub mod predicates;
pub mod query;
mod status;

pub use key::{KeyComponent, KeyError, KeyTemplate};
pub use meta::RequestMeta;
pub use method::is_cacheable_method;
pub use status::StatusCodes;
