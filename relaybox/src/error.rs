use relaybox_http::KeyError;
use relaybox_store::StoreError;
use thiserror::Error;

/// Errors raised while deciding on or capturing a response.
///
/// None of them reaches the client. They are logged, kept on the
/// [`StreamContext`](crate::StreamContext) for inspection, and the exchange
/// continues without caching.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A rule's key could not be built from the request.
    #[error("failed to build cache key: {0}")]
    KeyBuild(#[from] KeyError),
    /// The store failed an operation.
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),
    /// The store accepted fewer body bytes than it was offered.
    #[error("store accepted {written} of {offered} body bytes")]
    CaptureShortfall { offered: usize, written: usize },
}
