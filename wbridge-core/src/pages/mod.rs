//! Page controllers.
//!
//! Each controller owns its state behind an `Arc<Mutex<_>>` shared between
//! its consumer loops and the render pass, attaches its notification
//! domains when displayed and detaches them when hidden.

mod account_mixer;
mod info;
mod order_history;
mod proposals;
mod transactions;
mod wallet_main;

pub use account_mixer::{ACCOUNT_MIXER_PAGE_ID, AccountMixerPage, MixerPageState};
pub use info::{INFO_PAGE_ID, InfoPage, InfoPageState};
pub use order_history::{ORDER_HISTORY_PAGE_ID, OrderHistoryPage, OrderHistoryState};
pub use proposals::{PROPOSALS_PAGE_ID, ProposalsPage, ProposalsPageState};
pub use transactions::{TRANSACTIONS_PAGE_ID, TransactionsPage, TransactionsPageState};
pub use wallet_main::{MAIN_PAGE_ID, MainPageState, WalletMainPage};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Page state stays usable after a handler panicked mid-update.
fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
