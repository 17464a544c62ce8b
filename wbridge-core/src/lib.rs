#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod consumers;
pub mod engine;
pub mod events;
pub mod lifecycle;
pub mod listeners;
pub mod notifications;
pub mod pages;
pub mod redraw;
