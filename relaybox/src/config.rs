//! Engine configuration.
//!
//! - [`EngineConfig`] - per-filter settings, usually loaded from YAML
//! - [`CacheSwitch`] - a shared on/off flag read at every attach

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use relaybox_core::ProxyId;
use serde::{Deserialize, Serialize};

/// Filter-level on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    On,
    Off,
}

/// Housekeeping settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingConfig {
    /// Maximum number of store entries removed by a single sweep.
    /// Zero disables housekeeping on the request path.
    #[serde(default = "HousekeepingConfig::default_budget")]
    pub budget: usize,
}

impl HousekeepingConfig {
    const fn default_budget() -> usize {
        64
    }
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            budget: Self::default_budget(),
        }
    }
}

/// Settings of one cache filter instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether this filter caches at all.
    #[serde(default)]
    pub status: Status,
    /// Identity of the proxy the filter is attached to. Recorded in every
    /// entry the filter creates.
    #[serde(default)]
    pub proxy: ProxyId,
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,
}

impl EngineConfig {
    /// Returns `true` when the filter is switched on.
    pub fn is_enabled(&self) -> bool {
        self.status == Status::On
    }
}

/// Process-wide cache on/off flag.
///
/// Clones share the same flag, so one switch handed to every engine turns
/// caching off for the whole process. Exchanges that are already attached
/// are not affected; the flag is read at attach time only.
#[derive(Debug, Clone)]
pub struct CacheSwitch {
    enabled: Arc<AtomicBool>,
}

impl CacheSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for CacheSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_clones_share_state() {
        let switch = CacheSwitch::default();
        let clone = switch.clone();
        assert!(clone.is_enabled());
        switch.disable();
        assert!(!clone.is_enabled());
        clone.enable();
        assert!(switch.is_enabled());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.is_enabled());
        assert_eq!(config.housekeeping.budget, 64);
    }
}
