//! Notification type definitions.
//!
//! A notification carries just enough to let a page decide whether to
//! refetch. Pages query the engine for current state afterwards.

use wbridge_sdk::objects::{
    MixerRunStatus, OrderSyncStatus, ProposalStatus, Transaction, WalletId,
};

/// One category of engine events.
///
/// Each domain has its own listener registry and its own channel per
/// consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationDomain {
    SyncProgress,
    TxAndBlock,
    AccountMixer,
    Proposal,
    Order,
}

impl NotificationDomain {
    pub const ALL: [NotificationDomain; 5] = [
        NotificationDomain::SyncProgress,
        NotificationDomain::TxAndBlock,
        NotificationDomain::AccountMixer,
        NotificationDomain::Proposal,
        NotificationDomain::Order,
    ];
}

impl std::fmt::Display for NotificationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NotificationDomain::SyncProgress => "sync_progress",
            NotificationDomain::TxAndBlock => "tx_and_block",
            NotificationDomain::AccountMixer => "account_mixer",
            NotificationDomain::Proposal => "proposal",
            NotificationDomain::Order => "order",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEventKind {
    /// A transaction entered the wallet (usually still unconfirmed).
    NewTransaction(Box<Transaction>),
    /// A known transaction was mined.
    Confirmed { hash: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEvent {
    pub kind: TxEventKind,
    pub wallet_id: WalletId,
    pub block_height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub wallet_id: WalletId,
    pub block_height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerEvent {
    pub run_status: MixerRunStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalSyncEvent {
    pub status: ProposalStatus,
    pub proposal_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSyncEvent {
    pub status: OrderSyncStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started { was_restarted: bool },
    Canceled { will_restart: bool },
    EndedWithError { error: String },
    Completed,
}

/// Everything an engine callback can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Sync(SyncEvent),
    Tx(TxEvent),
    Block(BlockEvent),
    Mixer(MixerEvent),
    Proposal(ProposalSyncEvent),
    Order(OrderSyncEvent),
}

impl Notification {
    /// The domain whose channel carries this notification.
    pub fn domain(&self) -> NotificationDomain {
        match self {
            Notification::Sync(_) => NotificationDomain::SyncProgress,
            Notification::Tx(_) | Notification::Block(_) => NotificationDomain::TxAndBlock,
            Notification::Mixer(_) => NotificationDomain::AccountMixer,
            Notification::Proposal(_) => NotificationDomain::Proposal,
            Notification::Order(_) => NotificationDomain::Order,
        }
    }

    /// Build the notification for a freshly decoded transaction.
    pub fn new_transaction(transaction: Transaction) -> Self {
        Notification::Tx(TxEvent {
            wallet_id: transaction.wallet_id,
            block_height: transaction.block_height,
            kind: TxEventKind::NewTransaction(Box::new(transaction)),
        })
    }
}
