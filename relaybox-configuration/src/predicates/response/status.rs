//! Status code predicate configuration.

use relaybox_http::predicates::response::{StatusClass, StatusCodePredicate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicates::ResponsePredicate;

/// Status predicate operation.
///
/// ```yaml
/// - Status: 200
/// - Status:
///     in: [200, 203]
/// - Status:
///     range: [200, 299]
/// - Status:
///     class: Success
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(untagged)]
pub enum Operation {
    Eq(u16),
    In { r#in: Vec<u16> },
    Range { range: (u16, u16) },
    Class { class: StatusClass },
}

pub(crate) fn parse_status(code: u16) -> Result<http::StatusCode, ConfigError> {
    http::StatusCode::from_u16(code).map_err(|_| ConfigError::InvalidStatusCode(code))
}

impl Operation {
    pub fn into_predicates(
        self,
        inner: ResponsePredicate,
    ) -> Result<ResponsePredicate, ConfigError> {
        match self {
            Operation::Eq(code) => Ok(Box::new(inner.status_code(parse_status(code)?))),
            Operation::In { r#in: codes } => {
                if codes.is_empty() {
                    return Err(ConfigError::EmptyList("Status.in"));
                }
                let codes = codes
                    .into_iter()
                    .map(parse_status)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(inner.status_code_in(codes)))
            }
            Operation::Range {
                range: (start, end),
            } => Ok(Box::new(
                inner.status_code_range(parse_status(start)?, parse_status(end)?),
            )),
            Operation::Class { class } => Ok(Box::new(inner.status_code_class(class))),
        }
    }
}
