//! Integration test support for relaybox.
//!
//! - [`fsm::FsmWorld`] - cucumber world driving a [`relaybox::CacheEngine`]
//!   through simulated proxy exchanges
//! - [`mock_store::MockStore`] - store with call counters and fault injection
//! - [`tracing`] - state transition capture and test subscriber setup

pub mod fsm;
pub mod mock_store;
pub mod tracing;
