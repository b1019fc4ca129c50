//! Header predicates shared by requests and responses.

mod operation;
mod predicate;

pub use operation::Operation;
pub use predicate::{HasHeaders, Header, HeaderPredicate};
