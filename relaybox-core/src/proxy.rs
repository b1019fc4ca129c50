//! Proxy identity attached to store entries.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of the proxy (frontend/backend section) that owns a rule set.
///
/// Every store entry records the proxy that created it, so entries built
/// by one proxy can be told apart from another proxy's in the shared store.
///
/// ```
/// use relaybox_core::ProxyId;
///
/// let proxy = ProxyId::new(3, "api");
/// assert_eq!(proxy.to_string(), "api#3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProxyId {
    id: u32,
    name: SmolStr,
}

impl ProxyId {
    /// Creates a new proxy identity.
    pub fn new(id: u32, name: impl Into<SmolStr>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the numeric proxy id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the proxy name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
