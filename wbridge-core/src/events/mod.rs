//! Notification types and channel infrastructure.
//!
//! # Event Flow
//!
//! 1. The engine invokes a callback on a `ListenerAdapter` from one of its
//!    worker threads.
//! 2. The adapter turns the raw arguments into a [`Notification`] and sends
//!    it on its bounded channel, blocking while the channel is full.
//! 3. The page's `ConsumerLoop` receives it, hands it to the page handler
//!    and requests a redraw.
//!
//! Ordering is FIFO within one channel. Nothing orders two domains
//! relative to each other.

pub mod channels;
pub mod types;

pub use channels::{
    notification_channel, NotificationReceiver, NotificationSender, DEFAULT_CHANNEL_BUFFER,
    TX_AND_BLOCK_CHANNEL_BUFFER,
};

pub use types::{
    BlockEvent, MixerEvent, Notification, NotificationDomain, OrderSyncEvent, ProposalSyncEvent,
    SyncEvent, TxEvent, TxEventKind,
};
