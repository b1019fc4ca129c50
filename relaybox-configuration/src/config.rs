//! Top-level configuration document.

use std::collections::HashSet;

use relaybox::{CacheEngine, EngineConfig, HousekeepingConfig, RuleSet, Status, Store};
use relaybox_core::ProxyId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::rule::RuleConfig;

/// Proxy mode. Only HTTP proxies can cache.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Http,
    Tcp,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
}

/// Cache configuration of one proxy.
///
/// ```yaml
/// status: on
/// proxy:
///   id: 1
///   name: web
/// housekeeping:
///   budget: 64
/// rules:
///   - name: static
///     key: path
///     codes: [200]
///     ttl: 1h
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq)]
pub struct CacheConfig {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Validated configuration, ready to build an engine from.
#[derive(Debug)]
pub struct EngineParts {
    pub config: EngineConfig,
    pub rules: RuleSet,
}

impl CacheConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Validates the document and builds the engine settings and rules.
    ///
    /// A proxy that is not in HTTP mode gets a warning and a switched-off
    /// filter.
    pub fn into_parts(self) -> Result<EngineParts, ConfigError> {
        let mut status = self.status;
        if self.proxy.mode != Mode::Http {
            warn!(
                proxy = %self.proxy.name,
                "cache filter is ignored for a proxy that is not in HTTP mode"
            );
            status = Status::Off;
        }

        let mut names = HashSet::new();
        for rule in &self.rules {
            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateRuleName(rule.name.clone()));
            }
        }

        let rules = self
            .rules
            .into_iter()
            .map(RuleConfig::into_rule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineParts {
            config: EngineConfig {
                status,
                proxy: ProxyId::new(self.proxy.id, self.proxy.name),
                housekeeping: self.housekeeping,
            },
            rules: RuleSet::new(rules),
        })
    }

    /// Builds a ready engine on top of `store`.
    pub fn into_engine<S: Store>(self, store: S) -> Result<CacheEngine<S>, ConfigError> {
        let EngineParts { config, rules } = self.into_parts()?;
        Ok(CacheEngine::builder(store).config(config).rules(rules).build())
    }
}
