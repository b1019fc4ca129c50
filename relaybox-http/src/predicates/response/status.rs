use async_trait::async_trait;
use http::response::Parts;
use relaybox_core::{Neutral, Predicate, PredicateResult};

/// HTTP status code classes for broad matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StatusClass {
    /// 1xx (100-199): Informational responses.
    Informational,
    /// 2xx (200-299): Successful responses.
    Success,
    /// 3xx (300-399): Redirection responses.
    Redirect,
    /// 4xx (400-499): Client error responses.
    ClientError,
    /// 5xx (500-599): Server error responses.
    ServerError,
}

impl StatusClass {
    fn matches(&self, code: http::StatusCode) -> bool {
        match self {
            StatusClass::Informational => code.is_informational(),
            StatusClass::Success => code.is_success(),
            StatusClass::Redirect => code.is_redirection(),
            StatusClass::ClientError => code.is_client_error(),
            StatusClass::ServerError => code.is_server_error(),
        }
    }
}

/// Matching operations for HTTP status codes.
#[derive(Debug)]
pub enum Operation {
    /// Match a specific status code.
    Eq(http::StatusCode),
    /// Match any of the specified status codes.
    In(Vec<http::StatusCode>),
    /// Match status codes within a range (inclusive).
    Range(http::StatusCode, http::StatusCode),
    /// Match all status codes in a class (e.g., all 2xx).
    Class(StatusClass),
}

impl Operation {
    fn matches(&self, status: http::StatusCode) -> bool {
        match self {
            Operation::Eq(expected) => status == *expected,
            Operation::In(codes) => codes.contains(&status),
            Operation::Range(start, end) => {
                status.as_u16() >= start.as_u16() && status.as_u16() <= end.as_u16()
            }
            Operation::Class(class) => class.matches(status),
        }
    }
}

/// A predicate that matches responses by HTTP status code.
///
/// This is a rule condition, evaluated while rules are selected. The
/// accepted codes checked after a rule is chosen are configured separately
/// through [`StatusCodes`](crate::StatusCodes).
///
/// ```
/// use relaybox_http::predicates::response::StatusCode;
///
/// let predicate = StatusCode::new(http::StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct StatusCode<P> {
    operation: Operation,
    inner: P,
}

impl StatusCode<Neutral<Parts>> {
    /// Creates a predicate matching a specific status code.
    pub fn new(status_code: http::StatusCode) -> Self {
        Self {
            operation: Operation::Eq(status_code),
            inner: Neutral::new(),
        }
    }

    /// Creates a predicate matching any status code in a class.
    pub fn new_class(class: StatusClass) -> Self {
        Self {
            operation: Operation::Class(class),
            inner: Neutral::new(),
        }
    }
}

impl<P> StatusCode<P> {
    /// Creates a predicate from an explicit operation.
    pub fn with_operation(inner: P, operation: Operation) -> Self {
        Self { operation, inner }
    }
}

/// Extension trait for adding status code matching to a predicate chain.
pub trait StatusCodePredicate: Sized {
    /// Matches a specific status code.
    fn status_code(self, status_code: http::StatusCode) -> StatusCode<Self>;

    /// Matches any of the given status codes.
    fn status_code_in(self, codes: Vec<http::StatusCode>) -> StatusCode<Self>;

    /// Matches an inclusive range of status codes.
    fn status_code_range(self, start: http::StatusCode, end: http::StatusCode)
    -> StatusCode<Self>;

    /// Matches a status class.
    fn status_code_class(self, class: StatusClass) -> StatusCode<Self>;
}

impl<P> StatusCodePredicate for P
where
    P: Predicate<Subject = Parts>,
{
    fn status_code(self, status_code: http::StatusCode) -> StatusCode<Self> {
        StatusCode::with_operation(self, Operation::Eq(status_code))
    }

    fn status_code_in(self, codes: Vec<http::StatusCode>) -> StatusCode<Self> {
        StatusCode::with_operation(self, Operation::In(codes))
    }

    fn status_code_range(
        self,
        start: http::StatusCode,
        end: http::StatusCode,
    ) -> StatusCode<Self> {
        StatusCode::with_operation(self, Operation::Range(start, end))
    }

    fn status_code_class(self, class: StatusClass) -> StatusCode<Self> {
        StatusCode::with_operation(self, Operation::Class(class))
    }
}

#[async_trait]
impl<P> Predicate for StatusCode<P>
where
    P: Predicate<Subject = Parts> + Send + Sync,
{
    type Subject = Parts;

    async fn check(&self, response: &Parts) -> PredicateResult {
        match self.inner.check(response).await {
            PredicateResult::Cacheable => {
                PredicateResult::from_match(self.operation.matches(response.status))
            }
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}
