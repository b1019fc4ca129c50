//! Path predicate configuration.

use relaybox_core::PredicateExt;
use relaybox_http::predicates::NeutralRequestPredicate;
use relaybox_http::predicates::request::PathPredicate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicates::RequestPredicate;

/// Path predicate operation.
///
/// ```yaml
/// # Single pattern
/// - Path: "/api/v1/{resource}/{id}"
///
/// # Any of several patterns
/// - Path:
///     in:
///       - "/api/v1/users"
///       - "/api/v2/users"
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(untagged)]
pub enum PathOperation {
    Pattern(String),
    In { r#in: Vec<String> },
}

impl PathOperation {
    pub fn into_predicates(self, inner: RequestPredicate) -> Result<RequestPredicate, ConfigError> {
        match self {
            PathOperation::Pattern(pattern) => Ok(Box::new(inner.path(pattern))),
            PathOperation::In { r#in: patterns } => {
                let any = patterns
                    .into_iter()
                    .map(|pattern| -> RequestPredicate {
                        Box::new(NeutralRequestPredicate::new().path(pattern))
                    })
                    .reduce(|acc, predicate| Box::new(acc.or(predicate)))
                    .ok_or(ConfigError::EmptyList("Path.in"))?;
                Ok(Box::new(inner.and(any)))
            }
        }
    }
}
