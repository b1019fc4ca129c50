//! Cucumber world driving the cache engine through simulated exchanges.

pub mod steps;
pub mod world;

pub use world::{ExchangeResult, FsmWorld, RESPONSE_HEAD};
