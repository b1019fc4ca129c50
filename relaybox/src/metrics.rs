//! Metrics declaration and recording.

use crate::CacheState;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of detached exchanges by final state.
    pub static ref CACHE_REQUESTS: &'static str = {
        metrics::describe_counter!(
            "relaybox_requests_total",
            "Total number of exchanges by final caching state."
        );
        "relaybox_requests_total"
    };
    /// Track number of captures aborted at detach.
    pub static ref CACHE_CAPTURE_ABORTED: &'static str = {
        metrics::describe_counter!(
            "relaybox_capture_aborted_total",
            "Total number of captures aborted when the exchange ended."
        );
        "relaybox_capture_aborted_total"
    };
    /// Track bytes mirrored into the store.
    pub static ref CACHE_CAPTURED_BYTES: &'static str = {
        metrics::describe_counter!(
            "relaybox_captured_bytes_total",
            "Total body bytes mirrored into the store."
        );
        "relaybox_captured_bytes_total"
    };
    /// Track store errors per store and operation.
    pub static ref CACHE_STORE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "relaybox_store_errors_total",
            "Total number of store errors per operation."
        );
        "relaybox_store_errors_total"
    };
    /// Track entries removed by housekeeping sweeps.
    pub static ref CACHE_SWEPT: &'static str = {
        metrics::describe_counter!(
            "relaybox_housekeeping_swept_total",
            "Total number of entries removed by housekeeping."
        );
        "relaybox_housekeeping_swept_total"
    };
}

/// Records the final state of a detached exchange.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_detach(state: CacheState, aborted: bool) {
    metrics::counter!(*CACHE_REQUESTS, "state" => state.as_str()).increment(1);
    if aborted {
        metrics::counter!(*CACHE_CAPTURE_ABORTED).increment(1);
    }
}

/// Records bytes mirrored into the store.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_captured(store: &str, bytes: usize) {
    metrics::counter!(*CACHE_CAPTURED_BYTES, "store" => store.to_owned()).increment(bytes as u64);
}

/// Records a failed store operation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_error(store: &str, operation: &'static str) {
    metrics::counter!(
        *CACHE_STORE_ERRORS,
        "store" => store.to_owned(),
        "operation" => operation
    )
    .increment(1);
}

/// Records entries removed by a sweep.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_swept(store: &str, removed: usize) {
    metrics::counter!(*CACHE_SWEPT, "store" => store.to_owned()).increment(removed as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_detach(_state: CacheState, _aborted: bool) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_captured(_store: &str, _bytes: usize) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_error(_store: &str, _operation: &'static str) {}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_swept(_store: &str, _removed: usize) {}
