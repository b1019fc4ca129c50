//! Query predicate configuration.

use indexmap::IndexMap;
use relaybox_http::predicates::request::QueryPredicate;
use relaybox_http::predicates::request::query::Operation;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicates::RequestPredicate;

/// Query parameter value configuration.
///
/// ```yaml
/// - Query:
///     page: "1"                # Implicit Eq
///     sort: ["asc", "desc"]    # Implicit In
///     lang:
///       exist: true
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(untagged)]
pub enum QueryValue {
    Eq(String),
    In(Vec<String>),
    Operation(QueryValueOperation),
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum QueryValueOperation {
    Eq(String),
    In(Vec<String>),
    #[serde(deserialize_with = "deserialize_exist")]
    Exist,
}

fn deserialize_exist<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::IgnoredAny;
    IgnoredAny::deserialize(deserializer)?;
    Ok(())
}

pub type QueryOperation = IndexMap<String, QueryValue>;

fn into_operation(name: String, value: QueryValue) -> Result<Operation, ConfigError> {
    match value {
        QueryValue::Eq(value) | QueryValue::Operation(QueryValueOperation::Eq(value)) => {
            Ok(Operation::Eq(name, value))
        }
        QueryValue::In(values) | QueryValue::Operation(QueryValueOperation::In(values)) => {
            if values.is_empty() {
                return Err(ConfigError::EmptyList("Query.in"));
            }
            Ok(Operation::In(name, values))
        }
        QueryValue::Operation(QueryValueOperation::Exist) => Ok(Operation::Exist(name)),
    }
}

pub fn into_predicates(
    params: QueryOperation,
    inner: RequestPredicate,
) -> Result<RequestPredicate, ConfigError> {
    params.into_iter().try_rfold(
        inner,
        |inner, (name, value)| -> Result<RequestPredicate, ConfigError> {
            Ok(Box::new(inner.query(into_operation(name, value)?)))
        },
    )
}
