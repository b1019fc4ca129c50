//! Caching rules and the ordered rule set.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http::response;
use relaybox_core::{Neutral, Predicate, PredicateResult};
use relaybox_http::{KeyTemplate, RequestMeta, StatusCodes};
use smol_str::SmolStr;

/// Boxed request predicate for dynamic dispatch.
pub type BoxRequestPredicate = Box<dyn Predicate<Subject = RequestMeta> + Send + Sync>;

/// Boxed response predicate for dynamic dispatch.
pub type BoxResponsePredicate = Box<dyn Predicate<Subject = response::Parts> + Send + Sync>;

/// Position of a rule in its [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Exchange data a rule is tested against.
#[derive(Debug, Clone, Copy)]
pub enum Phase<'a> {
    /// Request headers are known.
    Request(&'a RequestMeta),
    /// The response head is known as well.
    Response(&'a RequestMeta, &'a response::Parts),
}

/// A caching rule.
///
/// A rule has a request condition and an optional response condition. A
/// rule with a response condition cannot be decided on the request phase
/// and only matches once the response head is known.
pub struct Rule {
    name: SmolStr,
    enabled: AtomicBool,
    key: KeyTemplate,
    codes: StatusCodes,
    ttl: Option<Duration>,
    request: BoxRequestPredicate,
    response: Option<BoxResponsePredicate>,
}

impl Rule {
    pub fn builder(name: impl Into<SmolStr>) -> RuleBuilder {
        RuleBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enables the rule for exchanges attached from now on.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Disables the rule. Exchanges that already stashed a key for it keep
    /// their stash entry.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn key(&self) -> &KeyTemplate {
        &self.key
    }

    pub fn codes(&self) -> &StatusCodes {
        &self.codes
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Tests the rule's conditions against one exchange phase.
    pub async fn test(&self, phase: Phase<'_>) -> PredicateResult {
        match phase {
            Phase::Request(request) => {
                if self.response.is_some() {
                    return PredicateResult::NonCacheable;
                }
                self.request.check(request).await
            }
            Phase::Response(request, response) => {
                let matched = self.request.check(request).await;
                match &self.response {
                    Some(predicate) => matched.and_then(|| predicate.check(response)).await,
                    None => matched,
                }
            }
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("key", &self.key.to_string())
            .field("codes", &self.codes)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Rule`].
pub struct RuleBuilder {
    name: SmolStr,
    enabled: bool,
    key: KeyTemplate,
    codes: StatusCodes,
    ttl: Option<Duration>,
    request: BoxRequestPredicate,
    response: Option<BoxResponsePredicate>,
}

impl RuleBuilder {
    fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            key: KeyTemplate::default(),
            codes: StatusCodes::Any,
            ttl: None,
            request: Box::new(Neutral::<RequestMeta>::new()),
            response: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn key(mut self, key: KeyTemplate) -> Self {
        self.key = key;
        self
    }

    pub fn codes(mut self, codes: impl Into<StatusCodes>) -> Self {
        self.codes = codes.into();
        self
    }

    pub fn ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the request condition. Defaults to always matching.
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Predicate<Subject = RequestMeta> + Send + Sync + 'static,
    {
        self.request = Box::new(predicate);
        self
    }

    /// Sets a response condition, deferring the rule to the response phase.
    pub fn response<P>(mut self, predicate: P) -> Self
    where
        P: Predicate<Subject = response::Parts> + Send + Sync + 'static,
    {
        self.response = Some(Box::new(predicate));
        self
    }

    pub fn build(self) -> Rule {
        Rule {
            name: self.name,
            enabled: AtomicBool::new(self.enabled),
            key: self.key,
            codes: self.codes,
            ttl: self.ttl,
            request: self.request,
            response: self.response,
        }
    }
}

/// Rules of one proxy, in declared order.
///
/// Declared order is the only tie-break: the first matching rule wins.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// Looks a rule up by name.
    pub fn find(&self, name: &str) -> Option<(RuleId, &Rule)> {
        self.iter().find(|(_, rule)| rule.name() == name)
    }

    /// Iterates over all rules in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (RuleId(index), rule))
    }

    /// Iterates over enabled rules in declared order.
    pub fn enabled(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.iter().filter(|(_, rule)| rule.is_enabled())
    }

    /// Toggles a rule by name. Returns `false` if no rule has that name.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.find(name) {
            Some((_, rule)) => {
                if enabled {
                    rule.enable()
                } else {
                    rule.disable()
                }
                true
            }
            None => false,
        }
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
