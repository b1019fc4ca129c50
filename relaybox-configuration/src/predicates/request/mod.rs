mod method;
mod path;
mod query;

pub use method::MethodOperation;
pub use path::PathOperation;
pub use query::{QueryOperation, QueryValue, QueryValueOperation};

use relaybox_http::predicates::NeutralRequestPredicate;
use serde::{Deserialize, Serialize};

use super::RequestPredicate;
use super::header::{self, HeaderOperation};
use crate::error::ConfigError;

// Externally tagged: `Method: ...`, `Path: ...`, `Query: {...}`, `Header: {...}`
#[derive(Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Predicate {
    Method(MethodOperation),
    Path(PathOperation),
    Query(QueryOperation),
    Header(HeaderOperation),
}

impl Predicate {
    pub fn into_predicates(self, inner: RequestPredicate) -> Result<RequestPredicate, ConfigError> {
        match self {
            Predicate::Method(operation) => operation.into_predicates(inner),
            Predicate::Path(operation) => operation.into_predicates(inner),
            Predicate::Query(operation) => query::into_predicates(operation, inner),
            Predicate::Header(operation) => header::into_predicates(operation, inner),
        }
    }
}

/// Builds the request condition of a rule. An empty list always matches.
pub fn into_predicate(predicates: Vec<Predicate>) -> Result<RequestPredicate, ConfigError> {
    let neutral: RequestPredicate = Box::new(NeutralRequestPredicate::new());
    predicates
        .into_iter()
        .try_rfold(neutral, |inner, predicate| predicate.into_predicates(inner))
}
