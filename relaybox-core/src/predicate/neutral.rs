//! Neutral predicate that always returns `Cacheable`.

use std::marker::PhantomData;

use async_trait::async_trait;

use super::{Predicate, PredicateResult};

/// A predicate that always returns `Cacheable`.
///
/// A rule with no conditions uses this as its request predicate, and it is
/// the seed of every predicate chain built by `relaybox-http`.
#[derive(Clone, Copy)]
pub struct Neutral<S: ?Sized> {
    _phantom: PhantomData<fn(&S)>,
}

impl<S: ?Sized> std::fmt::Debug for Neutral<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neutral").finish()
    }
}

impl<S: ?Sized> Default for Neutral<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Neutral<S> {
    /// Creates a new neutral predicate.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<S> Predicate for Neutral<S>
where
    S: ?Sized + Sync,
{
    type Subject = S;

    async fn check(&self, _subject: &Self::Subject) -> PredicateResult {
        PredicateResult::Cacheable
    }
}
