//! Predicate configuration.
//!
//! Request and response conditions are written as flat lists; every entry
//! must match. An entry is a single-key map naming the predicate:
//!
//! ```yaml
//! when:
//!   - Method: GET
//!   - Path: "/api/{tail}*"
//!   - Header:
//!       accept: "application/json"
//! response:
//!   - Status: 200
//! ```

pub mod header;
pub mod request;
pub mod response;

use relaybox::{BoxRequestPredicate, BoxResponsePredicate};

pub type RequestPredicate = BoxRequestPredicate;
pub type ResponsePredicate = BoxResponsePredicate;
