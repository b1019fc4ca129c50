//! Request predicates over [`RequestMeta`](crate::RequestMeta).

pub mod header;
pub mod method;
pub mod path;
pub mod query;

pub use header::{Header, HeaderPredicate};
pub use method::{Method, MethodPredicate};
pub use path::{Path, PathPredicate};
pub use query::{Query, QueryPredicate};
