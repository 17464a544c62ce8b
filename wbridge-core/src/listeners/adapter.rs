//! Engine-facing listener adapter.
//!
//! The `ListenerAdapter` is responsible for:
//! - Implementing every engine callback trait from `wbridge-sdk`
//! - Translating raw callback arguments into a [`Notification`]
//! - Enqueueing it on the bounded channel of its registration
//!
//! Enqueueing blocks the calling engine thread while the channel is full.
//! A callback made from a multi-thread runtime worker blocks through
//! `block_in_place`. A current-thread runtime cannot block without stalling
//! the consumer, so there a full channel drops the notification.

use crate::events::{
    BlockEvent, MixerEvent, Notification, NotificationDomain, NotificationSender, OrderSyncEvent,
    ProposalSyncEvent, SyncEvent, TxEvent, TxEventKind,
};
use compact_str::CompactString;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, trace, warn};
use wbridge_sdk::engine::{
    AccountMixerNotificationListener, OrderNotificationListener, ProposalNotificationListener,
    SyncProgressListener, TxAndBlockNotificationListener,
};
use wbridge_sdk::objects::{
    MixerRunStatus, OrderSyncStatus, ProposalStatus, Transaction, WalletId,
};

/// Bridges engine callbacks for one domain onto one notification channel.
pub struct ListenerAdapter {
    domain: NotificationDomain,
    consumer: CompactString,
    sender: NotificationSender,
}

impl ListenerAdapter {
    pub fn new(domain: NotificationDomain, consumer: &str, sender: NotificationSender) -> Self {
        Self {
            domain,
            consumer: CompactString::from(consumer),
            sender,
        }
    }

    pub fn domain(&self) -> NotificationDomain {
        self.domain
    }

    /// Send a notification, waiting for capacity if the channel is full.
    ///
    /// A send only fails once the consumer has closed its receiver; the
    /// notification is dropped in that case.
    fn enqueue(&self, notification: Notification) {
        debug_assert_eq!(notification.domain(), self.domain);
        trace!(
            consumer = %self.consumer,
            domain = %self.domain,
            ?notification,
            "Enqueueing notification"
        );
        let delivered = match Handle::try_current() {
            Err(_) => self.sender.blocking_send(notification).is_ok(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.sender.send(notification)))
                    .is_ok()
            }
            Ok(_) => match self.sender.try_send(notification) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        consumer = %self.consumer,
                        domain = %self.domain,
                        "Channel full on a current-thread runtime, dropping notification"
                    );
                    return;
                }
                Err(TrySendError::Closed(_)) => false,
            },
        };
        if !delivered {
            debug!(
                consumer = %self.consumer,
                domain = %self.domain,
                "Consumer closed its channel, dropping notification"
            );
        }
    }
}

impl SyncProgressListener for ListenerAdapter {
    fn on_sync_started(&self, was_restarted: bool) {
        self.enqueue(Notification::Sync(SyncEvent::Started { was_restarted }));
    }

    fn on_sync_canceled(&self, will_restart: bool) {
        self.enqueue(Notification::Sync(SyncEvent::Canceled { will_restart }));
    }

    fn on_sync_ended_with_error(&self, error: &str) {
        self.enqueue(Notification::Sync(SyncEvent::EndedWithError {
            error: error.to_owned(),
        }));
    }

    fn on_sync_completed(&self) {
        self.enqueue(Notification::Sync(SyncEvent::Completed));
    }
}

impl TxAndBlockNotificationListener for ListenerAdapter {
    fn on_transaction(&self, transaction: &str) {
        let transaction = match Transaction::from_json(transaction) {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    consumer = %self.consumer,
                    error = %e,
                    "Error unmarshalling transaction"
                );
                return;
            }
        };
        self.enqueue(Notification::new_transaction(transaction));
    }

    fn on_block_attached(&self, wallet_id: WalletId, block_height: i32) {
        self.enqueue(Notification::Block(BlockEvent {
            wallet_id,
            block_height,
        }));
    }

    fn on_transaction_confirmed(&self, wallet_id: WalletId, hash: &str, block_height: i32) {
        self.enqueue(Notification::Tx(TxEvent {
            kind: TxEventKind::Confirmed {
                hash: hash.to_owned(),
            },
            wallet_id,
            block_height,
        }));
    }
}

impl AccountMixerNotificationListener for ListenerAdapter {
    fn on_mixer_run_status_changed(&self, status: MixerRunStatus) {
        self.enqueue(Notification::Mixer(MixerEvent { run_status: status }));
    }
}

impl ProposalNotificationListener for ListenerAdapter {
    fn on_proposal_sync_status_changed(&self, proposal_name: &str, status: ProposalStatus) {
        self.enqueue(Notification::Proposal(ProposalSyncEvent {
            status,
            proposal_name: proposal_name.to_owned(),
        }));
    }
}

impl OrderNotificationListener for ListenerAdapter {
    fn on_order_sync_status_changed(&self, status: OrderSyncStatus) {
        self.enqueue(Notification::Order(OrderSyncEvent { status }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::notification_channel;

    #[test]
    fn test_malformed_transaction_is_dropped() {
        let (tx, mut rx) = notification_channel(4);
        let adapter = ListenerAdapter::new(NotificationDomain::TxAndBlock, "test", tx);

        adapter.on_transaction("{\"walletID\": ");
        adapter.on_block_attached(1, 100);

        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::Block(BlockEvent {
                wallet_id: 1,
                block_height: 100
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transaction_payload_is_decoded() {
        let (tx, mut rx) = notification_channel(4);
        let adapter = ListenerAdapter::new(NotificationDomain::TxAndBlock, "test", tx);

        adapter.on_transaction(
            r#"{"walletID":2,"hash":"abc","type":"Regular","direction":1,"amount":100000000,"block_height":-1,"timestamp":0}"#,
        );

        match rx.try_recv().unwrap() {
            Notification::Tx(TxEvent {
                kind: TxEventKind::NewTransaction(tx),
                wallet_id,
                block_height,
            }) => {
                assert_eq!(wallet_id, 2);
                assert_eq!(block_height, -1);
                assert_eq!(tx.hash, "abc");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_channel_on_current_thread_runtime_drops_instead_of_panicking() {
        let (tx, mut rx) = notification_channel(1);
        let adapter = ListenerAdapter::new(NotificationDomain::TxAndBlock, "test", tx);

        adapter.on_block_attached(1, 1);
        adapter.on_block_attached(1, 2);

        assert_eq!(
            rx.recv().await,
            Some(Notification::Block(BlockEvent {
                wallet_id: 1,
                block_height: 1
            }))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callback_from_runtime_worker_waits_for_capacity() {
        let (tx, mut rx) = notification_channel(1);
        let adapter = ListenerAdapter::new(NotificationDomain::TxAndBlock, "test", tx);

        let producer = tokio::spawn(async move {
            for height in 0..3 {
                adapter.on_block_attached(1, height);
            }
        });

        let mut heights = Vec::new();
        while heights.len() < 3 {
            match rx.recv().await {
                Some(Notification::Block(BlockEvent { block_height, .. })) => {
                    heights.push(block_height)
                }
                other => panic!("unexpected notification: {other:?}"),
            }
        }
        producer.await.unwrap();
        assert_eq!(heights, vec![0, 1, 2]);
    }

    #[test]
    fn test_send_after_close_does_not_panic() {
        let (tx, mut rx) = notification_channel(1);
        let adapter = ListenerAdapter::new(NotificationDomain::Order, "test", tx);
        rx.close();

        adapter.on_order_sync_status_changed(OrderSyncStatus::Synced);
        assert!(rx.try_recv().is_err());
    }
}
