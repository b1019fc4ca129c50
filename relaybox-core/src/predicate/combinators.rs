//! Logical combinators for composing predicates.
//!
//! The [`PredicateExt`] trait provides fluent methods for composition:
//!
//! ```ignore
//! use relaybox_core::predicate::{Neutral, PredicateExt};
//!
//! let predicate = Neutral::new()
//!     .and(predicate1)
//!     .or(predicate2)
//!     .not();
//! ```

use async_trait::async_trait;

use super::{Predicate, PredicateResult};

/// Inverts a predicate result.
#[derive(Debug)]
pub struct Not<P> {
    predicate: P,
}

impl<P> Not<P> {
    /// Creates a new `Not` combinator wrapping the given predicate.
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<P> Predicate for Not<P>
where
    P: Predicate + Send + Sync,
{
    type Subject = P::Subject;

    async fn check(&self, subject: &Self::Subject) -> PredicateResult {
        match self.predicate.check(subject).await {
            PredicateResult::Cacheable => PredicateResult::NonCacheable,
            PredicateResult::NonCacheable => PredicateResult::Cacheable,
        }
    }
}

/// Requires both predicates to return `Cacheable`.
///
/// Short-circuits: the right predicate is not evaluated when the left one
/// returns `NonCacheable`.
#[derive(Debug)]
pub struct And<L, R> {
    left: L,
    right: R,
}

impl<L, R> And<L, R> {
    /// Creates a new `And` combinator from two predicates.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

#[async_trait]
impl<L, R> Predicate for And<L, R>
where
    L: Predicate + Send + Sync,
    R: Predicate<Subject = L::Subject> + Send + Sync,
{
    type Subject = L::Subject;

    async fn check(&self, subject: &Self::Subject) -> PredicateResult {
        match self.left.check(subject).await {
            PredicateResult::Cacheable => self.right.check(subject).await,
            PredicateResult::NonCacheable => PredicateResult::NonCacheable,
        }
    }
}

/// Requires either predicate to return `Cacheable`.
///
/// Short-circuits: the right predicate is not evaluated when the left one
/// returns `Cacheable`.
#[derive(Debug)]
pub struct Or<L, R> {
    left: L,
    right: R,
}

impl<L, R> Or<L, R> {
    /// Creates a new `Or` combinator from two predicates.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

#[async_trait]
impl<L, R> Predicate for Or<L, R>
where
    L: Predicate + Send + Sync,
    R: Predicate<Subject = L::Subject> + Send + Sync,
{
    type Subject = L::Subject;

    async fn check(&self, subject: &Self::Subject) -> PredicateResult {
        match self.left.check(subject).await {
            PredicateResult::NonCacheable => self.right.check(subject).await,
            PredicateResult::Cacheable => PredicateResult::Cacheable,
        }
    }
}

/// Extension trait for fluent predicate composition.
pub trait PredicateExt: Predicate + Sized {
    /// Combines this predicate with another using AND logic.
    fn and<R>(self, right: R) -> And<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        And::new(self, right)
    }

    /// Combines this predicate with another using OR logic.
    fn or<R>(self, right: R) -> Or<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        Or::new(self, right)
    }

    /// Inverts this predicate's result.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Boxes this predicate into a trait object.
    ///
    /// Rules store their predicates type-erased, so configuration code can
    /// assemble arbitrary chains at runtime.
    fn boxed(self) -> Box<dyn Predicate<Subject = Self::Subject> + Send + Sync>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<T: Predicate + Sized> PredicateExt for T {}
