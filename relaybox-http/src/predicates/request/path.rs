//! Path pattern matching predicate.
//!
//! Provides [`Path`] predicate for matching request paths against
//! [actix-router](https://docs.rs/actix-router) patterns.

use actix_router::ResourceDef;
use async_trait::async_trait;
use relaybox_core::{Neutral, Predicate, PredicateResult};

use crate::RequestMeta;

/// A predicate that matches request paths against a pattern.
///
/// # Pattern Syntax
///
/// - `{name}` matches a path segment
/// - `{name:regex}` matches with a regex constraint
/// - `{tail}*` matches the remaining path segments
#[derive(Debug)]
pub struct Path<P> {
    resource: ResourceDef,
    inner: P,
}

impl Path<Neutral<RequestMeta>> {
    /// Creates a predicate that matches request paths against a pattern.
    pub fn new(resource: ResourceDef) -> Self {
        Self {
            resource,
            inner: Neutral::new(),
        }
    }
}

/// Extension trait for adding path matching to a predicate chain.
pub trait PathPredicate: Sized {
    /// Adds a path pattern match to this predicate chain.
    fn path(self, resource: String) -> Path<Self>;
}

impl<P> PathPredicate for P
where
    P: Predicate<Subject = RequestMeta>,
{
    fn path(self, resource: String) -> Path<Self> {
        Path {
            resource: ResourceDef::from(resource),
            inner: self,
        }
    }
}

#[async_trait]
impl<P> Predicate for Path<P>
where
    P: Predicate<Subject = RequestMeta> + Send + Sync,
{
    type Subject = RequestMeta;

    async fn check(&self, request: &RequestMeta) -> PredicateResult {
        match self.inner.check(request).await {
            PredicateResult::Cacheable => {
                PredicateResult::from_match(self.resource.is_match(request.path()))
            }
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}
