//! Page lifecycle.
//!
//! A page starts consuming notifications when it becomes visible and stops
//! when it is hidden. [`PageContext`] is the cancellation scope of one
//! visibility period, [`NotificationHub`] attaches consumer loops to it,
//! and [`PageNavigator`] drives the enter/leave hooks of [`Page`]s.

mod context;
mod hub;
mod navigator;
mod session;

pub use context::PageContext;
pub use hub::{Attachment, NotificationHub};
pub use navigator::{Page, PageNavigator, TxForwarder, TxNotifiable};
pub use session::{SharedSession, WalletSessionState, WalletTab};
