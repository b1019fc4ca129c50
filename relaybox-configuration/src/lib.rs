//! # relaybox-configuration
//!
//! YAML configuration for the relaybox response cache.
//!
//! A [`CacheConfig`] document describes one proxy's cache filter: the
//! filter switch, the proxy identity, housekeeping settings and the
//! ordered caching rules with their request and response conditions.
//!
//! ```
//! use relaybox_configuration::CacheConfig;
//!
//! let yaml = r#"
//! proxy:
//!   id: 1
//!   name: web
//! rules:
//!   - name: api
//!     key: method.host.path
//!     codes: [200]
//!     ttl: 5m
//!     when:
//!       - Method: GET
//!       - Path: "/api/{tail}*"
//! "#;
//!
//! let parts = CacheConfig::from_yaml(yaml).unwrap().into_parts().unwrap();
//! assert_eq!(parts.rules.len(), 1);
//! assert_eq!(parts.config.proxy.name(), "web");
//! ```

mod config;
mod error;
pub mod predicates;
mod rule;

pub use config::{CacheConfig, EngineParts, Mode, ProxyConfig};
pub use error::ConfigError;
pub use rule::RuleConfig;
