//! Error types for store operations.

use thiserror::Error;

/// Error type for store operations.
///
/// None of these errors ever reaches the client: the engine degrades to
/// forwarding without caching.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another exchange is already creating an entry for this key.
    #[error("entry for key `{key}` is already being created")]
    Conflict {
        /// Key string of the contended entry.
        key: String,
    },

    /// The handle does not refer to an entry in `CREATING` state any more,
    /// for example because a sweep expired it.
    #[error("entry for key `{key}` is not being created")]
    NotFound {
        /// Key string of the missing entry.
        key: String,
    },

    /// The entry grew beyond the store's per-entry limit.
    #[error("entry exceeds the store limit of {limit} bytes")]
    EntryTooLarge {
        /// The configured limit.
        limit: usize,
    },

    /// Internal store error, state or computation error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
