//! Listener registration: the engine-facing half of the bridge.
//!
//! - `ListenerAdapter`: implements the engine callbacks, feeds a channel
//! - `ListenerRegistry`: one registration per consumer name and domain
//! - `Subscription`: owns a registration's receiver and its teardown

pub mod adapter;
pub mod registry;
pub mod subscription;

pub use adapter::ListenerAdapter;
pub use registry::{
    AddOutcome, ListenerRegistry, RegistrationHandle, RegistrationState, RegistryError,
    RegistryStats,
};
pub use subscription::Subscription;
