use std::sync::atomic::{AtomicBool, Ordering};

use relaybox_store::Store;
use tracing::{debug, warn};

use crate::metrics;

/// Triggers the store's expiration sweep on the request path.
///
/// At most one sweep runs at a time. A trigger that finds a sweep in
/// flight returns immediately.
#[derive(Debug)]
pub struct Housekeeper {
    running: AtomicBool,
    budget: usize,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Housekeeper {
    pub fn new(budget: usize) -> Self {
        Self {
            running: AtomicBool::new(false),
            budget,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Runs one bounded sweep. Returns the number of removed entries, or
    /// `None` if the sweep was skipped or failed.
    pub async fn run<S>(&self, store: &S) -> Option<usize>
    where
        S: Store + ?Sized,
    {
        if self.budget == 0 {
            return None;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        let _guard = RunningGuard(&self.running);
        match store.sweep_expired(self.budget).await {
            Ok(removed) => {
                if removed > 0 {
                    debug!(removed, store = store.name(), "housekeeping sweep");
                    metrics::record_swept(store.name(), removed);
                }
                Some(removed)
            }
            Err(error) => {
                warn!(%error, store = store.name(), "housekeeping sweep failed");
                metrics::record_store_error(store.name(), "sweep");
                None
            }
        }
    }
}
