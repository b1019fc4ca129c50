//! Query parameter matching predicate.

use async_trait::async_trait;
use relaybox_core::{Neutral, Predicate, PredicateResult};

use crate::RequestMeta;

/// Operations for matching query parameters.
#[derive(Debug)]
pub enum Operation {
    /// Match if the parameter equals the value. Format: `(name, expected_value)`.
    Eq(String, String),
    /// Match if the parameter exists (regardless of value).
    Exist(String),
    /// Match if the parameter value is one of these values.
    In(String, Vec<String>),
}

/// A predicate that matches requests by query parameters.
///
/// ```
/// use relaybox_http::predicates::request::query::{Operation, Query};
///
/// // Cache only when "format" query parameter is "json"
/// let predicate = Query::new(Operation::Eq("format".into(), "json".into()));
/// ```
#[derive(Debug)]
pub struct Query<P> {
    /// The operation to perform on the query parameter.
    pub operation: Operation,
    inner: P,
}

impl Query<Neutral<RequestMeta>> {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            inner: Neutral::new(),
        }
    }
}

/// Extension trait for adding query parameter matching to a predicate chain.
pub trait QueryPredicate: Sized {
    /// Adds a query parameter match to this predicate chain.
    fn query(self, operation: Operation) -> Query<Self>;
}

impl<P> QueryPredicate for P
where
    P: Predicate<Subject = RequestMeta>,
{
    fn query(self, operation: Operation) -> Query<Self> {
        Query {
            operation,
            inner: self,
        }
    }
}

#[async_trait]
impl<P> Predicate for Query<P>
where
    P: Predicate<Subject = RequestMeta> + Send + Sync,
{
    type Subject = RequestMeta;

    async fn check(&self, request: &RequestMeta) -> PredicateResult {
        match self.inner.check(request).await {
            PredicateResult::Cacheable => {
                let is_cacheable = match request.query().and_then(crate::query::parse) {
                    Some(query_map) => match &self.operation {
                        Operation::Eq(name, value) => query_map
                            .get(name)
                            .map(|v| v.contains(value))
                            .unwrap_or_default(),
                        Operation::Exist(name) => query_map.contains_key(name),
                        Operation::In(name, values) => query_map
                            .get(name)
                            .is_some_and(|value| values.iter().any(|v| value.contains(v))),
                    },
                    None => false,
                };
                PredicateResult::from_match(is_cacheable)
            }
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}
