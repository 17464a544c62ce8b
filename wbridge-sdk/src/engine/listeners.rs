//! Listener callbacks, one trait per notification domain.

use crate::objects::{MixerRunStatus, OrderSyncStatus, ProposalStatus, WalletId};

/// Wallet sync progress callbacks.
pub trait SyncProgressListener: Send + Sync {
    fn on_sync_started(&self, was_restarted: bool);
    fn on_sync_canceled(&self, will_restart: bool);
    fn on_sync_ended_with_error(&self, error: &str);
    fn on_sync_completed(&self);
}

/// Transaction and block callbacks.
pub trait TxAndBlockNotificationListener: Send + Sync {
    /// `transaction` is the JSON-serialized [`Transaction`](crate::objects::Transaction).
    fn on_transaction(&self, transaction: &str);
    fn on_block_attached(&self, wallet_id: WalletId, block_height: i32);
    fn on_transaction_confirmed(&self, wallet_id: WalletId, hash: &str, block_height: i32);
}

pub trait AccountMixerNotificationListener: Send + Sync {
    fn on_mixer_run_status_changed(&self, status: MixerRunStatus);
}

pub trait ProposalNotificationListener: Send + Sync {
    fn on_proposal_sync_status_changed(&self, proposal_name: &str, status: ProposalStatus);
}

pub trait OrderNotificationListener: Send + Sync {
    fn on_order_sync_status_changed(&self, status: OrderSyncStatus);
}
