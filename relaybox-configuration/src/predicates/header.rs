//! Shared header predicate configuration types.
//!
//! Used by both request and response header predicates.

use http::header::{HeaderName, HeaderValue as HttpHeaderValue};
use indexmap::IndexMap;
use regex::Regex;
use relaybox_core::Predicate;
use relaybox_http::predicates::header::{HasHeaders, HeaderPredicate, Operation};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Header value configuration supporting multiple formats.
///
/// ```yaml
/// # Shorthand forms
/// Content-Type: "application/json"           # Implicit Eq
/// Accept: ["application/json", "text/html"]  # Implicit In
///
/// # Explicit operation form
/// X-Custom:
///   contains: "value"
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(untagged)]
pub enum HeaderValue {
    Eq(String),
    In(Vec<String>),
    Operation(HeaderValueOperation),
}

/// Explicit header value operations.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum HeaderValueOperation {
    Eq(String),
    In(Vec<String>),
    Contains(String),
    Regex(String),
    /// Header is present, the value is ignored.
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

/// Map of header names to their value operations, in declared order.
pub type HeaderOperation = IndexMap<String, HeaderValue>;

pub fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse()
        .map_err(|e| ConfigError::InvalidHeaderName(name.to_string(), e))
}

pub fn parse_header_value(value: &str) -> Result<HttpHeaderValue, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::InvalidHeaderValue(value.to_string(), e))
}

fn parse_header_values(values: &[String]) -> Result<Vec<HttpHeaderValue>, ConfigError> {
    values.iter().map(|v| parse_header_value(v)).collect()
}

/// Converts one configured header into a predicate operation.
pub fn header_value_to_operation(
    name: HeaderName,
    header_value: HeaderValue,
) -> Result<Operation, ConfigError> {
    match header_value {
        HeaderValue::Eq(value) | HeaderValue::Operation(HeaderValueOperation::Eq(value)) => {
            Ok(Operation::Eq(name, parse_header_value(&value)?))
        }
        HeaderValue::In(values) | HeaderValue::Operation(HeaderValueOperation::In(values)) => {
            Ok(Operation::In(name, parse_header_values(&values)?))
        }
        HeaderValue::Operation(HeaderValueOperation::Contains(substring)) => {
            Ok(Operation::Contains(name, substring))
        }
        HeaderValue::Operation(HeaderValueOperation::Regex(pattern)) => {
            let compiled = Regex::new(&pattern).map_err(|error| ConfigError::InvalidRegex {
                pattern: pattern.clone(),
                error,
            })?;
            Ok(Operation::Regex(name, compiled))
        }
        HeaderValue::Operation(HeaderValueOperation::Exist) => Ok(Operation::Exist(name)),
    }
}

/// Wraps `inner` with one header check per configured header.
pub fn into_predicates<S>(
    headers: HeaderOperation,
    inner: Box<dyn Predicate<Subject = S> + Send + Sync>,
) -> Result<Box<dyn Predicate<Subject = S> + Send + Sync>, ConfigError>
where
    S: HasHeaders + Send + Sync + 'static,
{
    headers.into_iter().try_rfold(
        inner,
        |inner, (header_name, header_value)| -> Result<Box<dyn Predicate<Subject = S> + Send + Sync>, ConfigError> {
            let name = parse_header_name(&header_name)?;
            let operation = header_value_to_operation(name, header_value)?;
            Ok(Box::new(inner.header(operation)))
        },
    )
}
