use http::StatusCode;

/// Response status codes accepted by a rule.
///
/// A rule configured without codes accepts every status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusCodes {
    /// Any status is accepted.
    #[default]
    Any,
    /// Only the listed statuses are accepted.
    List(Vec<StatusCode>),
}

impl StatusCodes {
    /// Returns `true` if a response with `status` may be cached.
    pub fn accepts(&self, status: StatusCode) -> bool {
        match self {
            StatusCodes::Any => true,
            StatusCodes::List(codes) => codes.contains(&status),
        }
    }
}

impl From<Vec<StatusCode>> for StatusCodes {
    fn from(codes: Vec<StatusCode>) -> Self {
        if codes.is_empty() {
            StatusCodes::Any
        } else {
            StatusCodes::List(codes)
        }
    }
}
