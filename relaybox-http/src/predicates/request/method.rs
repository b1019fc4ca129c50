use async_trait::async_trait;
use relaybox_core::{Neutral, Predicate, PredicateResult};

use crate::RequestMeta;

/// Matching operations for HTTP methods.
#[derive(Debug)]
pub enum Operation {
    /// Match a single HTTP method.
    Eq(http::Method),
    /// Match any of the specified HTTP methods.
    In(Vec<http::Method>),
}

impl Operation {
    fn matches(&self, method: &http::Method) -> bool {
        match self {
            Operation::Eq(expected) => expected == method,
            Operation::In(methods) => methods.contains(method),
        }
    }
}

/// A predicate that matches requests by HTTP method.
///
/// ```
/// use relaybox_http::predicates::request::Method;
///
/// let get = Method::new(http::Method::GET).unwrap();
/// let by_name = Method::new("HEAD").unwrap();
/// ```
#[derive(Debug)]
pub struct Method<P> {
    operation: Operation,
    inner: P,
}

impl Method<Neutral<RequestMeta>> {
    /// Creates a predicate matching requests with the specified HTTP method.
    ///
    /// # Errors
    ///
    /// Returns an error if `method` cannot be converted to [`http::Method`].
    pub fn new<E, T>(method: T) -> Result<Self, E>
    where
        T: TryInto<http::Method, Error = E>,
    {
        Ok(Method {
            operation: Operation::Eq(method.try_into()?),
            inner: Neutral::new(),
        })
    }
}

impl<P> Method<P> {
    /// Creates a predicate matching requests with any of the specified methods.
    pub fn new_in(inner: P, methods: Vec<http::Method>) -> Self {
        Method {
            operation: Operation::In(methods),
            inner,
        }
    }
}

/// Extension trait for adding method matching to a predicate chain.
pub trait MethodPredicate: Sized {
    /// Adds an HTTP method match to this predicate chain.
    fn method(self, method: http::Method) -> Method<Self>;
}

impl<P> MethodPredicate for P
where
    P: Predicate<Subject = RequestMeta>,
{
    fn method(self, method: http::Method) -> Method<Self> {
        Method {
            operation: Operation::Eq(method),
            inner: self,
        }
    }
}

#[async_trait]
impl<P> Predicate for Method<P>
where
    P: Predicate<Subject = RequestMeta> + Send + Sync,
{
    type Subject = RequestMeta;

    async fn check(&self, request: &RequestMeta) -> PredicateResult {
        match self.inner.check(request).await {
            PredicateResult::Cacheable => {
                PredicateResult::from_match(self.operation.matches(request.method()))
            }
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}
