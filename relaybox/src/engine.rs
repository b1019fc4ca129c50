//! The cache decision engine.

use std::sync::Arc;

use http::{request, response};
use relaybox_core::CacheKey;
use relaybox_http::{RequestMeta, is_cacheable_method};
use relaybox_store::{CachedEntry, EntryMeta, Store, StoreError};
use tracing::{debug, warn};

use crate::config::{CacheSwitch, EngineConfig};
use crate::housekeeping::Housekeeper;
use crate::rule::{Phase, RuleId, RuleSet};
use crate::stats::CacheStats;
use crate::{CacheError, CacheState, StreamContext, metrics};

/// What the proxy should do after the request headers were seen.
#[derive(Debug)]
pub enum RequestAction {
    /// Forward the request upstream.
    Forward,
    /// Serve this entry instead of contacting the upstream.
    ServeFromCache(CachedEntry),
}

/// Caching state machine shared by all exchanges of one proxy.
///
/// The engine is driven by the proxy through one hook per pipeline event:
///
/// ```text
/// attach ─► on_request_headers ─► on_response_headers ─► on_body_chunk* ─► on_body_end ─► detach
/// ```
///
/// Every hook takes the exchange's [`StreamContext`]. Hooks never fail:
/// caching problems are logged and the exchange continues uncached, so the
/// bytes delivered to the client are never affected.
pub struct CacheEngine<S> {
    pub(crate) store: S,
    pub(crate) rules: Arc<RuleSet>,
    pub(crate) config: EngineConfig,
    pub(crate) switch: CacheSwitch,
    pub(crate) housekeeper: Housekeeper,
    pub(crate) stats: Arc<CacheStats>,
}

impl<S> std::fmt::Debug for CacheEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("rules", &self.rules)
            .field("config", &self.config)
            .field("switch", &self.switch)
            .finish_non_exhaustive()
    }
}

impl<S> CacheEngine<S>
where
    S: Store,
{
    pub fn builder(store: S) -> CacheEngineBuilder<S> {
        CacheEngineBuilder::new(store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn switch(&self) -> &CacheSwitch {
        &self.switch
    }

    /// Starts caching for a new exchange.
    ///
    /// Returns `None` when caching is switched off process-wide or for this
    /// filter; the exchange then runs without any caching hooks.
    pub fn attach(&self) -> Option<StreamContext> {
        if !self.switch.is_enabled() || !self.config.is_enabled() {
            return None;
        }
        Some(StreamContext::new())
    }

    /// Request phase, with the request head as received.
    pub async fn on_request_headers(
        &self,
        ctx: &mut StreamContext,
        request: &request::Parts,
    ) -> RequestAction {
        self.on_request(ctx, RequestMeta::from_parts(request)).await
    }

    /// Request phase, with an already captured request snapshot.
    pub async fn on_request(&self, ctx: &mut StreamContext, meta: RequestMeta) -> RequestAction {
        self.housekeeper.run(&self.store).await;

        if ctx.state != CacheState::Init || ctx.request.is_some() {
            return RequestAction::Forward;
        }

        if !is_cacheable_method(meta.method()) {
            debug!(method = %meta.method(), "method is not cacheable");
            ctx.transition(CacheState::Bypass);
            ctx.request = Some(meta);
            return RequestAction::Forward;
        }

        let mut action = RequestAction::Forward;
        for (id, rule) in self.rules.enabled() {
            let key = match rule.key().build(&meta) {
                Ok(key) => key,
                Err(error) => {
                    debug!(rule = rule.name(), %error, "skipping rule");
                    ctx.error = Some(error.into());
                    continue;
                }
            };
            debug!(rule = rule.name(), key = key.as_str(), hash = key.hash(), "checking key");
            ctx.stash.push(id, key.clone());

            match self.store.exists(&key).await {
                Ok(Some(entry)) => {
                    debug!(rule = rule.name(), key = key.as_str(), "found cached entry");
                    ctx.rule = Some(id);
                    ctx.transition(CacheState::Hit);
                    action = RequestAction::ServeFromCache(entry);
                    break;
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, store = self.store.name(), "cache lookup failed");
                    metrics::record_store_error(self.store.name(), "exists");
                    ctx.error = Some(error.into());
                }
            }

            if rule.test(Phase::Request(&meta)).await.is_cacheable() {
                debug!(rule = rule.name(), "rule matched request");
                ctx.rule = Some(id);
                ctx.transition(CacheState::Pass);
                break;
            }
        }

        ctx.request = Some(meta);
        action
    }

    /// Response phase, once the response head is known.
    ///
    /// `header_len` is the number of header bytes the proxy counts as
    /// forwarded data; they are skipped before the body is mirrored.
    pub async fn on_response_headers(
        &self,
        ctx: &mut StreamContext,
        response: &response::Parts,
        header_len: usize,
    ) {
        if ctx.state == CacheState::Init {
            self.match_response(ctx, response).await;
        }
        if ctx.state != CacheState::Pass || ctx.entry.is_some() {
            return;
        }
        let Some(id) = ctx.rule else {
            return;
        };
        let Some(rule) = self.rules.get(id) else {
            return;
        };

        if !rule.codes().accepts(response.status) {
            debug!(rule = rule.name(), status = %response.status, "status is not cached");
            return;
        }

        let Some(key) = self.rule_key(ctx, id) else {
            return;
        };

        let meta = EntryMeta {
            proxy: self.config.proxy.clone(),
            ttl: rule.ttl(),
            head: response.into(),
        };
        match self.store.create(&key, meta).await {
            Ok(handle) => {
                debug!(rule = rule.name(), key = key.as_str(), "capturing response");
                ctx.entry = Some(handle);
                ctx.body_offset = header_len;
                ctx.transition(CacheState::Create);
            }
            Err(StoreError::Conflict { .. }) => {
                debug!(key = key.as_str(), "entry is being created by another exchange");
            }
            Err(error) => {
                warn!(%error, store = self.store.name(), "failed to create cache entry");
                metrics::record_store_error(self.store.name(), "create");
                ctx.error = Some(error.into());
            }
        }
    }

    async fn match_response(&self, ctx: &mut StreamContext, response: &response::Parts) {
        let Some(meta) = ctx.request.as_ref() else {
            return;
        };
        let mut matched = None;
        for (id, rule) in self.rules.enabled() {
            if rule.test(Phase::Response(meta, response)).await.is_cacheable() {
                debug!(rule = rule.name(), "rule matched response");
                matched = Some(id);
                break;
            }
        }
        if let Some(id) = matched {
            ctx.rule = Some(id);
            ctx.transition(CacheState::Pass);
        }
    }

    /// Key of the matched rule: the stashed one, or built now for a rule
    /// that has no stash entry.
    fn rule_key(&self, ctx: &mut StreamContext, id: RuleId) -> Option<CacheKey> {
        if let Some(entry) = ctx.stash.find(id) {
            return Some(entry.key().clone());
        }
        let rule = self.rules.get(id)?;
        let meta = ctx.request.as_ref()?;
        match rule.key().build(meta) {
            Ok(key) => {
                ctx.stash.push(id, key.clone());
                Some(key)
            }
            Err(error) => {
                debug!(rule = rule.name(), %error, "cannot build key on response");
                ctx.error = Some(error.into());
                None
            }
        }
    }

    /// Releases the exchange.
    ///
    /// Safe in any state. A capture still open here did not see the end of
    /// the body, so its entry is aborted.
    ///
    /// Must be called on every exit path of the exchange, including errors
    /// and client disconnects. A [`StreamContext`] dropped without `detach`
    /// cannot abort its entry: it only logs a warning, and the entry stays
    /// in creation until the store's own sweep removes it. Until then
    /// other exchanges for the same key are not captured.
    pub async fn detach(&self, mut ctx: StreamContext) {
        let aborted = match ctx.entry.take() {
            Some(handle) => {
                debug!(key = %handle.key(), "aborting unfinished capture");
                if let Err(error) = self.store.abort(handle).await {
                    warn!(%error, store = self.store.name(), "failed to abort cache entry");
                    metrics::record_store_error(self.store.name(), "abort");
                }
                true
            }
            None => false,
        };
        self.stats.record(ctx.state, aborted);
        metrics::record_detach(ctx.state, aborted);
    }

    pub(crate) fn fail_capture(&self, ctx: &mut StreamContext, error: CacheError) {
        warn!(%error, store = self.store.name(), "capture failed");
        ctx.error = Some(error);
        ctx.transition(CacheState::Invalid);
    }
}

/// Builder for [`CacheEngine`].
pub struct CacheEngineBuilder<S> {
    store: S,
    rules: Arc<RuleSet>,
    config: EngineConfig,
    switch: CacheSwitch,
    stats: Option<Arc<CacheStats>>,
}

impl<S> CacheEngineBuilder<S> {
    fn new(store: S) -> Self {
        Self {
            store,
            rules: Arc::new(RuleSet::default()),
            config: EngineConfig::default(),
            switch: CacheSwitch::default(),
            stats: None,
        }
    }

    pub fn rules(mut self, rules: impl Into<Arc<RuleSet>>) -> Self {
        self.rules = rules.into();
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares a process-wide switch with other engines.
    pub fn switch(mut self, switch: CacheSwitch) -> Self {
        self.switch = switch;
        self
    }

    /// Shares counters with other engines.
    pub fn stats(mut self, stats: Arc<CacheStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> CacheEngine<S> {
        let housekeeper = Housekeeper::new(self.config.housekeeping.budget);
        CacheEngine {
            store: self.store,
            rules: self.rules,
            config: self.config,
            switch: self.switch,
            housekeeper,
            stats: self.stats.unwrap_or_default(),
        }
    }
}
