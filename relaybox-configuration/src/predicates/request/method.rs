//! Method predicate configuration.

use relaybox_http::predicates::request::{Method, MethodPredicate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicates::RequestPredicate;

/// Method predicate operation.
///
/// ```yaml
/// - Method: GET
/// - Method:
///     in: [GET, HEAD]
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(untagged)]
pub enum MethodOperation {
    Eq(String),
    In { r#in: Vec<String> },
}

fn parse_method(method: &str) -> Result<http::Method, ConfigError> {
    http::Method::from_bytes(method.as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(method.to_string()))
}

impl MethodOperation {
    pub fn into_predicates(self, inner: RequestPredicate) -> Result<RequestPredicate, ConfigError> {
        match self {
            MethodOperation::Eq(method) => Ok(Box::new(inner.method(parse_method(&method)?))),
            MethodOperation::In { r#in: methods } => {
                if methods.is_empty() {
                    return Err(ConfigError::EmptyList("Method.in"));
                }
                let methods = methods
                    .iter()
                    .map(|method| parse_method(method))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(Method::new_in(inner, methods)))
            }
        }
    }
}
