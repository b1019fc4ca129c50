pub mod status;

use relaybox_http::predicates::NeutralResponsePredicate;
use serde::{Deserialize, Serialize};

use super::ResponsePredicate;
use super::header::{self, HeaderOperation};
use crate::error::ConfigError;

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub enum Predicate {
    Status(status::Operation),
    Header(HeaderOperation),
}

impl Predicate {
    pub fn into_predicates(
        self,
        inner: ResponsePredicate,
    ) -> Result<ResponsePredicate, ConfigError> {
        match self {
            Predicate::Status(operation) => operation.into_predicates(inner),
            Predicate::Header(operation) => header::into_predicates(operation, inner),
        }
    }
}

/// Builds the response condition of a rule.
///
/// Returns `None` for an empty list: such a rule is decided on the
/// request phase like a rule without a `response` section.
pub fn into_predicate(
    predicates: Vec<Predicate>,
) -> Result<Option<ResponsePredicate>, ConfigError> {
    if predicates.is_empty() {
        return Ok(None);
    }
    let neutral: ResponsePredicate = Box::new(NeutralResponsePredicate::new());
    predicates
        .into_iter()
        .try_rfold(neutral, |inner, predicate| predicate.into_predicates(inner))
        .map(Some)
}
