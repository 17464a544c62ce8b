//! Engine-facing contract of the wallet notification bridge.
//!
//! The wallet engine (sync, account mixer, governance proposal sync, swap
//! order sync) is a black box to the bridge. This crate holds the types both
//! sides agree on: the wire objects the engine hands out and the listener
//! callbacks it invokes.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod objects;

pub use engine::{EngineError, NotificationEngine, WalletQueries};
