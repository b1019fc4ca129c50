use async_trait::async_trait;
use http::HeaderMap;
use relaybox_core::{Neutral, Predicate, PredicateResult};

use super::operation::Operation;
use crate::RequestMeta;

#[derive(Debug)]
pub struct Header<P> {
    pub(crate) operation: Operation,
    pub(crate) inner: P,
}

impl<S: ?Sized> Header<Neutral<S>> {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inner: Neutral::new(),
        }
    }
}

pub trait HeaderPredicate: Sized {
    fn header(self, operation: Operation) -> Header<Self>;
}

impl<P> HeaderPredicate for P
where
    P: Predicate,
{
    fn header(self, operation: Operation) -> Header<Self> {
        Header {
            operation,
            inner: self,
        }
    }
}

/// Subjects that carry a header map.
pub trait HasHeaders {
    fn headers(&self) -> &HeaderMap;
}

impl HasHeaders for RequestMeta {
    fn headers(&self) -> &HeaderMap {
        RequestMeta::headers(self)
    }
}

impl HasHeaders for http::response::Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl<P> Predicate for Header<P>
where
    P: Predicate + Send + Sync,
    P::Subject: HasHeaders,
{
    type Subject = P::Subject;

    async fn check(&self, subject: &Self::Subject) -> PredicateResult {
        match self.inner.check(subject).await {
            PredicateResult::Cacheable => {
                PredicateResult::from_match(self.operation.check(subject.headers()))
            }
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}
