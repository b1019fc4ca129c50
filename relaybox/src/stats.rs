//! Request counters updated at detach.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::CacheState;

/// Counters of finished exchanges by final state.
#[derive(Debug, Default)]
pub struct CacheStats {
    total: AtomicU64,
    hit: AtomicU64,
    fetch: AtomicU64,
    bypass: AtomicU64,
    abort: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Every detached exchange.
    pub total: u64,
    /// Exchanges served from the cache.
    pub hit: u64,
    /// Exchanges that fetched from upstream under a matched rule.
    pub fetch: u64,
    /// Exchanges whose method is not eligible.
    pub bypass: u64,
    /// Captures aborted at detach.
    pub abort: u64,
}

impl CacheStats {
    pub fn record(&self, state: CacheState, aborted: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match state {
            CacheState::Hit => {
                self.hit.fetch_add(1, Ordering::Relaxed);
            }
            CacheState::Bypass => {
                self.bypass.fetch_add(1, Ordering::Relaxed);
            }
            state if state.is_fetch() => {
                self.fetch.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        if aborted {
            self.abort.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            hit: self.hit.load(Ordering::Relaxed),
            fetch: self.fetch.load(Ordering::Relaxed),
            bypass: self.bypass.load(Ordering::Relaxed),
            abort: self.abort.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_by_state() {
        let stats = CacheStats::default();
        stats.record(CacheState::Hit, false);
        stats.record(CacheState::Create, true);
        stats.record(CacheState::Invalid, false);
        stats.record(CacheState::Bypass, false);
        stats.record(CacheState::Init, false);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                total: 5,
                hit: 1,
                fetch: 2,
                bypass: 1,
                abort: 1,
            }
        );
    }
}
