use relaybox_http::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("rule `{rule}` has an invalid key template: {error}")]
    InvalidKeyTemplate {
        rule: String,
        #[source]
        error: KeyError,
    },
    #[error("invalid status code {0}")]
    InvalidStatusCode(u16),
    #[error("invalid regex `{pattern}`: {error}")]
    InvalidRegex {
        pattern: String,
        #[source]
        error: regex::Error,
    },
    #[error("invalid method `{0}`")]
    InvalidMethod(String),
    #[error("invalid header name `{0}`: {1}")]
    InvalidHeaderName(String, #[source] http::header::InvalidHeaderName),
    #[error("invalid header value `{0}`: {1}")]
    InvalidHeaderValue(String, #[source] http::header::InvalidHeaderValue),
    #[error("`{0}` needs at least one entry")]
    EmptyList(&'static str),
    #[error("rule name must not be empty")]
    EmptyRuleName,
    #[error("duplicate rule name `{0}`")]
    DuplicateRuleName(String),
}
