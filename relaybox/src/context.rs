use relaybox_http::RequestMeta;
use relaybox_store::EntryHandle;
use tracing::warn;

use crate::{CacheError, CacheState, RuleId, Stash};

/// State of one exchange, threaded through every pipeline hook.
///
/// Created by [`CacheEngine::attach`](crate::CacheEngine::attach) and
/// released by [`CacheEngine::detach`](crate::CacheEngine::detach). The
/// context is owned by the exchange and is never shared between exchanges.
#[derive(Debug, Default)]
pub struct StreamContext {
    pub(crate) state: CacheState,
    pub(crate) rule: Option<RuleId>,
    pub(crate) stash: Stash,
    pub(crate) request: Option<RequestMeta>,
    pub(crate) entry: Option<EntryHandle>,
    pub(crate) body_offset: usize,
    pub(crate) captured: usize,
    pub(crate) error: Option<CacheError>,
}

impl StreamContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Rule chosen for this exchange.
    pub fn matched_rule(&self) -> Option<RuleId> {
        self.rule
    }

    pub fn stash(&self) -> &Stash {
        &self.stash
    }

    /// Request snapshot taken on the request phase.
    pub fn request(&self) -> Option<&RequestMeta> {
        self.request.as_ref()
    }

    /// Returns `true` while a store entry is open for writing.
    pub fn has_open_entry(&self) -> bool {
        self.entry.is_some()
    }

    /// Header bytes still to be skipped at the start of the forwarded data.
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// Body bytes mirrored into the store so far.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// The most recent caching error of this exchange.
    pub fn error(&self) -> Option<&CacheError> {
        self.error.as_ref()
    }

    pub(crate) fn transition(&mut self, next: CacheState) {
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "cache state");
        self.state = next;
    }
}

impl Drop for StreamContext {
    fn drop(&mut self) {
        if let Some(entry) = &self.entry {
            warn!(
                key = %entry.key(),
                "stream context dropped with an open store entry; left for the store sweep"
            );
        }
    }
}
