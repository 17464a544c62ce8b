//! Engine implementations that live alongside the bridge.
//!
//! The production engine is an external library reached through the
//! `wbridge-sdk` traits. [`InMemoryEngine`] implements the same traits in
//! process so that the bridge can be driven by the simulator and by tests.

mod memory;

pub use memory::{InMemoryEngine, RegistrationCounts};
