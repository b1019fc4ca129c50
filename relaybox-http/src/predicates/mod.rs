//! Rule conditions for HTTP exchanges.
//!
//! Request predicates check the owned [`RequestMeta`] snapshot. Response
//! predicates check the response head ([`http::response::Parts`]) once it
//! is available.
//!
//! Predicates are built as chains starting from a constructor such as
//! [`request::Method::new`] and extended through the extension traits:
//!
//! ```
//! use relaybox_core::{Predicate, PredicateResult};
//! use relaybox_http::RequestMeta;
//! use relaybox_http::predicates::request::{Method, PathPredicate};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let predicate = Method::new(http::Method::GET)
//!     .unwrap()
//!     .path("/api/{tail}*".to_owned());
//!
//! let (parts, _) = http::Request::get("/api/users").body(()).unwrap().into_parts();
//! let meta = RequestMeta::from_parts(&parts);
//! assert_eq!(predicate.check(&meta).await, PredicateResult::Cacheable);
//! # }
//! ```

use relaybox_core::Neutral;

use crate::RequestMeta;

pub mod header;
pub mod request;
pub mod response;

pub type NeutralRequestPredicate = Neutral<RequestMeta>;

pub type NeutralResponsePredicate = Neutral<http::response::Parts>;
