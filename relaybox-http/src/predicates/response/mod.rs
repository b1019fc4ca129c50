//! Response predicates over [`http::response::Parts`].

pub mod header;
pub mod status;

pub use header::{Header, HeaderPredicate};
pub use status::{StatusClass, StatusCode, StatusCodePredicate};
