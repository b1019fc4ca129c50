//! Caching rule predicates.
//!
//! This module provides the [`Predicate`] trait and [`PredicateResult`] enum
//! used to decide whether a caching rule applies to the request or response
//! flowing through the proxy.
//!
//! ## Overview
//!
//! A predicate inspects a borrowed subject and answers `Cacheable` or
//! `NonCacheable`. The proxy keeps ownership of its request and response
//! heads, so predicates never take the subject by value.
//!
//! ## Composability
//!
//! Predicates are composed with logical combinators:
//!
//! - [`And`] - both predicates must return `Cacheable`
//! - [`Or`] - either predicate returning `Cacheable` is sufficient
//! - [`Not`] - inverts a predicate result

pub mod combinators;
pub mod neutral;

use std::sync::Arc;

use async_trait::async_trait;

pub use combinators::{And, Not, Or, PredicateExt};
pub use neutral::Neutral;

/// Result of a predicate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateResult {
    /// The rule applies to the subject.
    Cacheable,
    /// The rule does not apply; the subject is passed through.
    NonCacheable,
}

impl PredicateResult {
    /// Returns `true` for [`PredicateResult::Cacheable`].
    #[inline]
    pub const fn is_cacheable(self) -> bool {
        matches!(self, PredicateResult::Cacheable)
    }

    /// Converts a boolean match into a result.
    #[inline]
    pub const fn from_match(matched: bool) -> Self {
        if matched {
            PredicateResult::Cacheable
        } else {
            PredicateResult::NonCacheable
        }
    }

    /// Chains predicate checks.
    ///
    /// `NonCacheable` is sticky: the closure is only evaluated when the
    /// current result is `Cacheable`.
    pub async fn and_then<F, Fut>(self, f: F) -> PredicateResult
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = PredicateResult>,
    {
        match self {
            PredicateResult::Cacheable => f().await,
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}

/// Trait for evaluating whether a caching rule applies to a subject.
///
/// Predicates are **protocol-agnostic**: the `Subject` associated type is
/// whatever the protocol layer hands over (an HTTP request snapshot, a
/// response head, ...).
///
/// # Evaluation order
///
/// Rules are tested in their declared order and the first `Cacheable`
/// answer wins, so a predicate must be side-effect free: it may be called
/// on the request phase and again on the response phase of the same
/// exchange.
#[async_trait]
pub trait Predicate {
    /// The type being evaluated by this predicate.
    type Subject: ?Sized + Sync;

    /// Evaluate whether the subject matches.
    async fn check(&self, subject: &Self::Subject) -> PredicateResult;
}

#[async_trait]
impl<T> Predicate for Box<T>
where
    T: Predicate + ?Sized + Sync + Send,
{
    type Subject = T::Subject;

    async fn check(&self, subject: &T::Subject) -> PredicateResult {
        self.as_ref().check(subject).await
    }
}

#[async_trait]
impl<T> Predicate for &T
where
    T: Predicate + ?Sized + Sync,
{
    type Subject = T::Subject;

    async fn check(&self, subject: &T::Subject) -> PredicateResult {
        (*self).check(subject).await
    }
}

#[async_trait]
impl<T> Predicate for Arc<T>
where
    T: Predicate + Send + Sync + ?Sized,
{
    type Subject = T::Subject;

    async fn check(&self, subject: &T::Subject) -> PredicateResult {
        self.as_ref().check(subject).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_predicate_ext_with_box_dyn() {
        let p1: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Neutral::<i32>::new());
        let p2: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Neutral::<i32>::new());

        let combined = p1.or(p2);

        assert_eq!(combined.check(&42).await, PredicateResult::Cacheable);
    }

    #[tokio::test]
    async fn test_predicate_ext_chaining_with_box_dyn() {
        let p1 = Neutral::<i32>::new().boxed();
        let p2 = Neutral::<i32>::new().boxed();
        let p3 = Neutral::<i32>::new().boxed();

        // Cacheable AND Cacheable = Cacheable, OR Cacheable = Cacheable, NOT = NonCacheable
        let combined = p1.and(p2).or(p3).not();

        assert_eq!(combined.check(&42).await, PredicateResult::NonCacheable);
    }

    #[tokio::test]
    async fn test_predicates_in_vec() {
        let predicates: Vec<Box<dyn Predicate<Subject = i32> + Send + Sync>> = vec![
            Neutral::<i32>::new().boxed(),
            Neutral::<i32>::new().not().boxed(),
        ];

        assert!(predicates[0].check(&1).await.is_cacheable());
        assert!(!predicates[1].check(&2).await.is_cacheable());
    }

    #[tokio::test]
    async fn test_and_then_is_sticky() {
        let mut called = false;
        let result = PredicateResult::NonCacheable
            .and_then(|| {
                called = true;
                async { PredicateResult::Cacheable }
            })
            .await;
        assert_eq!(result, PredicateResult::NonCacheable);
        assert!(!called);
    }
}
