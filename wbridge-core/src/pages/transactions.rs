use super::lock;
use crate::lifecycle::{NotificationHub, Page, TxNotifiable};
use crate::redraw::RedrawHandle;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::warn;
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{Transaction, WalletId};

pub const TRANSACTIONS_PAGE_ID: &str = "Transactions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsPageState {
    pub selected_wallet: WalletId,
    pub newest_first: bool,
    pub transactions: Vec<Transaction>,
}

struct TransactionsView {
    queries: Arc<dyn WalletQueries>,
    redraw: RedrawHandle,
    state: Mutex<TransactionsPageState>,
}

impl TransactionsView {
    fn load(&self) {
        let (wallet_id, newest_first) = {
            let state = lock(&self.state);
            (state.selected_wallet, state.newest_first)
        };
        match self.queries.transactions(wallet_id, newest_first) {
            Ok(transactions) => lock(&self.state).transactions = transactions,
            Err(e) => warn!(wallet_id, error = %e, "Failed to load transactions"),
        }
    }
}

impl TxNotifiable for TransactionsView {
    fn on_wallet_tx(&self, wallet_id: WalletId) {
        if lock(&self.state).selected_wallet != wallet_id {
            return;
        }
        self.load();
        self.redraw.request();
    }
}

/// Transaction list of the selected wallet.
///
/// Has no listener of its own; its host forwards new transactions.
pub struct TransactionsPage {
    view: Arc<TransactionsView>,
}

impl TransactionsPage {
    pub fn new(wallet_id: WalletId, queries: Arc<dyn WalletQueries>, redraw: RedrawHandle) -> Self {
        Self {
            view: Arc::new(TransactionsView {
                queries,
                redraw,
                state: Mutex::new(TransactionsPageState {
                    selected_wallet: wallet_id,
                    newest_first: true,
                    transactions: Vec::new(),
                }),
            }),
        }
    }

    pub fn select_wallet(&self, wallet_id: WalletId) {
        lock(&self.view.state).selected_wallet = wallet_id;
        self.view.load();
    }

    pub fn state(&self) -> TransactionsPageState {
        lock(&self.view.state).clone()
    }
}

#[async_trait]
impl Page for TransactionsPage {
    fn id(&self) -> &'static str {
        TRANSACTIONS_PAGE_ID
    }

    async fn on_navigated_to(&mut self, _hub: &NotificationHub) {
        self.view.load();
    }

    async fn on_navigated_from(&mut self) {}

    fn tx_notifiable(&self) -> Option<Arc<dyn TxNotifiable>> {
        Some(self.view.clone())
    }
}
