//! The contract between the wallet engine and its listeners.
//!
//! The engine invokes listener callbacks from its own worker threads. It
//! never expects a return value from them, so callbacks are plain
//! synchronous methods that must not propagate errors back.

pub mod listeners;

pub use listeners::{
    AccountMixerNotificationListener, OrderNotificationListener, ProposalNotificationListener,
    SyncProgressListener, TxAndBlockNotificationListener,
};

use crate::objects::{Order, Proposal, Transaction, WalletId, WalletInfo};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A listener is already registered under this name
    #[error("listener already exists: {0}")]
    ListenerExists(String),

    /// The wallet is not opened by the engine
    #[error("unknown wallet: {0}")]
    UnknownWallet(WalletId),

    /// The engine refused the request
    #[error("engine rejected request: {0}")]
    Rejected(String),

    /// The engine is shutting down
    #[error("engine is shutting down")]
    ShuttingDown,
}

/// Listener registration surface of the engine.
///
/// Every `add_*` call is keyed by a unique name; `remove_*` with a name
/// that is not registered is a no-op.
pub trait NotificationEngine: Send + Sync {
    fn add_sync_progress_listener(
        &self,
        listener: Arc<dyn SyncProgressListener>,
        name: &str,
    ) -> Result<(), EngineError>;
    fn remove_sync_progress_listener(&self, name: &str);

    fn add_tx_and_block_listener(
        &self,
        listener: Arc<dyn TxAndBlockNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError>;
    fn remove_tx_and_block_listener(&self, name: &str);

    fn add_account_mixer_listener(
        &self,
        listener: Arc<dyn AccountMixerNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError>;
    fn remove_account_mixer_listener(&self, name: &str);

    fn add_proposal_listener(
        &self,
        listener: Arc<dyn ProposalNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError>;
    fn remove_proposal_listener(&self, name: &str);

    fn add_order_listener(
        &self,
        listener: Arc<dyn OrderNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError>;
    fn remove_order_listener(&self, name: &str);
}

/// Read-only queries pages use to refetch state after a notification.
pub trait WalletQueries: Send + Sync {
    fn wallet(&self, wallet_id: WalletId) -> Result<WalletInfo, EngineError>;

    fn opened_wallets_count(&self) -> usize;

    fn transactions(
        &self,
        wallet_id: WalletId,
        newest_first: bool,
    ) -> Result<Vec<Transaction>, EngineError>;

    fn is_account_mixer_active(&self, wallet_id: WalletId) -> Result<bool, EngineError>;

    fn proposals(&self) -> Result<Vec<Proposal>, EngineError>;

    /// Orders newest first, paginated.
    fn orders(&self, offset: usize, limit: usize) -> Result<Vec<Order>, EngineError>;
}
