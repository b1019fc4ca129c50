//! Rule configuration.

use std::time::Duration;

use relaybox::Rule;
use relaybox_http::{KeyTemplate, StatusCodes};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicates::response::status::parse_status;
use crate::predicates::{request, response};

/// One caching rule.
///
/// ```yaml
/// name: api
/// key: method.scheme.host.path.delimiter.query
/// codes: [200, 301]
/// ttl: 10m
/// when:
///   - Path: "/api/{tail}*"
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct RuleConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Key template, `method.scheme.host.uri` when absent.
    #[serde(default)]
    pub key: Option<String>,
    /// Cacheable status codes, any when absent.
    #[serde(default)]
    pub codes: Option<Vec<u16>>,
    /// Entry lifetime, entries never expire when absent.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    #[serde(default)]
    pub when: Vec<request::Predicate>,
    #[serde(default)]
    pub response: Vec<response::Predicate>,
}

fn default_enabled() -> bool {
    true
}

impl RuleConfig {
    pub fn into_rule(self) -> Result<Rule, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyRuleName);
        }

        let key = match &self.key {
            Some(template) => {
                template
                    .parse::<KeyTemplate>()
                    .map_err(|error| ConfigError::InvalidKeyTemplate {
                        rule: self.name.clone(),
                        error,
                    })?
            }
            None => KeyTemplate::default(),
        };

        let codes = match self.codes {
            Some(codes) => StatusCodes::from(
                codes
                    .into_iter()
                    .map(parse_status)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => StatusCodes::Any,
        };

        let mut builder = Rule::builder(self.name)
            .enabled(self.enabled)
            .key(key)
            .codes(codes)
            .ttl(self.ttl)
            .when(request::into_predicate(self.when)?);
        if let Some(predicate) = response::into_predicate(self.response)? {
            builder = builder.response(predicate);
        }
        Ok(builder.build())
    }
}
