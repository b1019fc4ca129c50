//! # relaybox-memory
//!
//! A [`Store`](relaybox_store::Store) kept in process memory.
//!
//! Complete entries and entries being created live in separate concurrent
//! maps, so a lookup never sees a partial body and a second writer for the
//! same key is refused while the first one is still capturing.

mod builder;
pub mod metrics;
mod store;

pub use builder::MemoryStoreBuilder;
pub use store::MemoryStore;
