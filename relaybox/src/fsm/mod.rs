//! Per-exchange caching state.

mod state;

pub use state::CacheState;
