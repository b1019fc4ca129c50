use std::fmt;

/// Caching decision of one exchange.
///
/// ```text
/// INIT ──► BYPASS
///   ├────► HIT
///   └────► PASS ──► CREATE ──► INVALID
/// ```
///
/// `INIT` may last until the response headers if no rule matched on the
/// request phase. Every other state is only ever left forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheState {
    /// No decision yet.
    #[default]
    Init,
    /// The request method is not eligible for caching.
    Bypass,
    /// A complete entry was found and is served instead of the upstream.
    Hit,
    /// A rule matched; the response may be captured.
    Pass,
    /// The response body is being captured into a store entry.
    Create,
    /// Capture failed and the store entry was abandoned.
    Invalid,
}

impl CacheState {
    /// Returns the state as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheState::Init => "init",
            CacheState::Bypass => "bypass",
            CacheState::Hit => "hit",
            CacheState::Pass => "pass",
            CacheState::Create => "create",
            CacheState::Invalid => "invalid",
        }
    }

    /// Returns `true` if the exchange fetched its response from upstream
    /// under a matched rule.
    pub const fn is_fetch(&self) -> bool {
        matches!(
            self,
            CacheState::Pass | CacheState::Create | CacheState::Invalid
        )
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
