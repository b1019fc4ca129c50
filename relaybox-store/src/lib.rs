// #![warn(missing_docs)]
//! The cache store boundary.
//!
//! The decision engine never owns cached data. Every entry lives in an
//! external store that is shared by all exchanges and reached through the
//! [`Store`] trait defined here. If you want to plug in your own storage,
//! you are in the right place.
//!
//! ## Entry lifecycle
//!
//! ```text
//! create ──► CREATING ──append*──► finish ──► COMPLETE (servable)
//!                │
//!                └──────────────► abort  ──► removed
//! ```
//!
//! The [`EntryHandle`] returned by [`Store::create`] is the exclusive write
//! capability for one `CREATING` entry. `finish` and `abort` consume it, so
//! an entry is closed at most once.
mod entry;
mod error;
mod store;

pub use entry::{CachedEntry, EntryHandle, EntryMeta, ResponseHead};
pub use error::StoreError;
pub use store::{Store, StoreResult};
