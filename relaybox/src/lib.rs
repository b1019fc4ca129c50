#![cfg_attr(docsrs, feature(doc_cfg))]
//! # relaybox
//!
//! Decision and capture core of a response cache embedded in a reverse
//! proxy pipeline.
//!
//! For every exchange the [`CacheEngine`] decides whether the response can
//! be served from the cache, finds the matching entry, decides whether an
//! uncached response should be captured, and mirrors the forwarded body
//! into the store chunk by chunk, without buffering the response and
//! without ever changing the bytes the client receives.
//!
//! ```
//! use relaybox::{CacheEngine, RequestAction, Rule, RuleSet};
//! use relaybox_http::KeyTemplate;
//! use relaybox_memory::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let rules = RuleSet::new(vec![
//!     Rule::builder("all")
//!         .key("path".parse::<KeyTemplate>().unwrap())
//!         .codes(vec![http::StatusCode::OK])
//!         .build(),
//! ]);
//! let engine = CacheEngine::builder(MemoryStore::new()).rules(rules).build();
//!
//! let (request, _) = http::Request::get("/a").body(()).unwrap().into_parts();
//! let (response, _) = http::Response::new(()).into_parts();
//!
//! let mut ctx = engine.attach().unwrap();
//! assert!(matches!(
//!     engine.on_request_headers(&mut ctx, &request).await,
//!     RequestAction::Forward
//! ));
//! engine.on_response_headers(&mut ctx, &response, 0).await;
//! assert_eq!(engine.on_body_chunk(&mut ctx, b"hello").await, 5);
//! engine.on_body_end(&mut ctx).await;
//! engine.detach(ctx).await;
//!
//! let mut ctx = engine.attach().unwrap();
//! assert!(matches!(
//!     engine.on_request_headers(&mut ctx, &request).await,
//!     RequestAction::ServeFromCache(_)
//! ));
//! engine.detach(ctx).await;
//! # }
//! ```

mod capture;
pub mod config;
mod context;
mod engine;
mod error;
pub mod fsm;
pub mod housekeeping;
pub mod metrics;
pub mod rule;
mod stash;
pub mod stats;

pub use config::{CacheSwitch, EngineConfig, HousekeepingConfig, Status};
pub use context::StreamContext;
pub use engine::{CacheEngine, CacheEngineBuilder, RequestAction};
pub use error::CacheError;
pub use fsm::CacheState;
pub use rule::{BoxRequestPredicate, BoxResponsePredicate, Phase, Rule, RuleBuilder, RuleId, RuleSet};
pub use stash::{Stash, StashEntry};
pub use stats::{CacheStats, StatsSnapshot};

pub use relaybox_core::{CacheKey, Predicate, PredicateExt, PredicateResult, ProxyId};
pub use relaybox_http::{KeyTemplate, RequestMeta, StatusCodes};
pub use relaybox_store::{CachedEntry, Store};
