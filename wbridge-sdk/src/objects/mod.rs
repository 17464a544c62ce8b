pub mod asset;
pub mod exchange;
pub mod governance;
pub mod status;
pub mod transaction;
pub mod wallet;

pub use asset::Asset;
pub use exchange::{Order, OrderStatus};
pub use governance::{Proposal, ProposalCategory};
pub use status::{MixerRunStatus, OrderSyncStatus, ProposalStatus};
pub use transaction::{Transaction, TxDirection, TxType};
pub use wallet::WalletInfo;

/// Identifier the engine assigns to every opened wallet.
pub type WalletId = i32;
