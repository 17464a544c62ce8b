//! Notification channel factory.
//!
//! Every listener registration owns exactly one bounded channel. The
//! adapter holds the only sender, the registration's subscription holds
//! the receiver.

use super::types::Notification;
use tokio::sync::mpsc;

/// Buffer size for the transaction/block channel.
pub const TX_AND_BLOCK_CHANNEL_BUFFER: usize = 4;

/// Buffer size for every other domain.
pub const DEFAULT_CHANNEL_BUFFER: usize = 8;

/// Sender handle for notifications (producer side, held by the adapter).
pub type NotificationSender = mpsc::Sender<Notification>;
/// Receiver handle for notifications (consumer side, held by the subscription).
pub type NotificationReceiver = mpsc::Receiver<Notification>;

/// Create a new bounded notification channel.
///
/// A zero capacity is bumped to one since tokio channels cannot be
/// unbuffered.
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    mpsc::channel(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{BlockEvent, Notification};

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (tx, _rx) = notification_channel(0);
        assert_eq!(tx.max_capacity(), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let (tx, _rx) = notification_channel(TX_AND_BLOCK_CHANNEL_BUFFER);
        for height in 0..TX_AND_BLOCK_CHANNEL_BUFFER as i32 {
            tx.try_send(Notification::Block(BlockEvent {
                wallet_id: 1,
                block_height: height,
            }))
            .unwrap();
        }
        assert!(
            tx.try_send(Notification::Block(BlockEvent {
                wallet_id: 1,
                block_height: 99,
            }))
            .is_err()
        );
    }
}
