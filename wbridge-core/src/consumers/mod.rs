//! Consumer side of the bridge.
//!
//! - `NotificationHandler`: page-specific reaction to a notification
//! - `ConsumerLoop`: drains one subscription for one page visibility period

pub mod consumer_loop;
pub mod handler;

pub use consumer_loop::ConsumerLoop;
pub use handler::{FnHandler, HandlerError, NotificationHandler, Redraw, handler_fn};
