//! Memory store occupancy metrics.
//!
//! - `relaybox_memory_entries` - complete entries held (gauge)
//! - `relaybox_memory_creating` - entries being created (gauge)
//!
//! Both carry a `store` label to tell several stores apart.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the complete entry gauge.
    pub static ref MEMORY_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "relaybox_memory_entries",
            "Current number of complete entries in the memory store."
        );
        "relaybox_memory_entries"
    };

    /// Metric name for the in-progress entry gauge.
    pub static ref MEMORY_CREATING: &'static str = {
        metrics::describe_gauge!(
            "relaybox_memory_creating",
            "Current number of entries being created in the memory store."
        );
        "relaybox_memory_creating"
    };
}

/// Record current occupancy.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_occupancy(store: &str, entries: usize, creating: usize) {
    metrics::gauge!(*MEMORY_ENTRIES, "store" => store.to_string()).set(entries as f64);
    metrics::gauge!(*MEMORY_CREATING, "store" => store.to_string()).set(creating as f64);
}

/// Record current occupancy (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_occupancy(_store: &str, _entries: usize, _creating: usize) {}
