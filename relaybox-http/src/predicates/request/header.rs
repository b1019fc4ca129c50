//! Request header matching predicates.
//!
//! Re-exports header predicates from the shared [`header`](crate::predicates::header) module.

pub use crate::predicates::header::{Header, HeaderPredicate, Operation};
