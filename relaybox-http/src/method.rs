use http::Method;

/// Returns `true` if an exchange with this request method may take part in
/// caching at all.
///
/// Every standard method is eligible: whether it is actually cached is up
/// to the rules. Extension methods are bypassed before any rule runs.
pub fn is_cacheable_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::OPTIONS
            | Method::GET
            | Method::HEAD
            | Method::POST
            | Method::PUT
            | Method::DELETE
            | Method::TRACE
            | Method::CONNECT
    )
}
