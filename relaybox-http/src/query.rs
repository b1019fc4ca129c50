//! Query string parsing shared by the query predicate and the `param_`
//! key component.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    Array(Vec<String>),
}

impl Value {
    pub fn inner(&self) -> Vec<String> {
        match self {
            Value::Scalar(value) => vec![value.to_owned()],
            Value::Array(values) => values.to_owned(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Value::Scalar(scalar) => scalar == value,
            Value::Array(values) => values.iter().any(|v| v == value),
        }
    }

    /// Renders the value for use in a cache key. Array values are joined
    /// with `,` in their original order.
    pub fn to_key_value(&self) -> String {
        match self {
            Value::Scalar(value) => value.clone(),
            Value::Array(values) => values.join(","),
        }
    }
}

/// Parses a query string. Returns `None` for a malformed query.
pub fn parse(value: &str) -> Option<HashMap<String, Value>> {
    serde_qs::from_str(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_one() {
        let hash_map = parse("key=value").unwrap();
        let value = hash_map.get("key").unwrap();
        assert_eq!(value.inner(), vec!["value"]);
    }

    #[test]
    fn test_parse_valid_multiple() {
        let hash_map = parse("key-one=value-one&key-two=value-two").unwrap();
        assert_eq!(hash_map.get("key-one").unwrap().inner(), vec!["value-one"]);
        assert_eq!(hash_map.get("key-two").unwrap().inner(), vec!["value-two"]);
    }

    #[test]
    fn test_parse_array_bracket_syntax() {
        let hash_map = parse("color[]=red&color[]=blue").unwrap();
        let value = hash_map.get("color").unwrap();
        assert_eq!(value.inner(), vec!["red", "blue"]);
        assert!(value.contains("blue"));
        assert_eq!(value.to_key_value(), "red,blue");
    }
}
