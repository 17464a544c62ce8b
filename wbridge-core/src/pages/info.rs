use super::lock;
use crate::lifecycle::{NotificationHub, Page, TxNotifiable};
use crate::redraw::RedrawHandle;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::warn;
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{Transaction, WalletId};

pub const INFO_PAGE_ID: &str = "Info";

const RECENT_TRANSACTIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoPageState {
    pub balance: Option<i64>,
    pub recent_transactions: Vec<Transaction>,
}

struct InfoView {
    wallet_id: WalletId,
    queries: Arc<dyn WalletQueries>,
    redraw: RedrawHandle,
    state: Mutex<InfoPageState>,
}

impl InfoView {
    fn refresh(&self) {
        match self.queries.wallet(self.wallet_id) {
            Ok(wallet) => lock(&self.state).balance = Some(wallet.balance),
            Err(e) => warn!(wallet_id = self.wallet_id, error = %e, "Failed to read balance"),
        }
        match self.queries.transactions(self.wallet_id, true) {
            Ok(mut transactions) => {
                transactions.truncate(RECENT_TRANSACTIONS);
                lock(&self.state).recent_transactions = transactions;
            }
            Err(e) => warn!(wallet_id = self.wallet_id, error = %e, "Failed to load recent transactions"),
        }
    }
}

impl TxNotifiable for InfoView {
    fn on_wallet_tx(&self, wallet_id: WalletId) {
        if wallet_id != self.wallet_id {
            return;
        }
        self.refresh();
        self.redraw.request();
    }
}

/// Wallet overview: balance and the latest transactions.
pub struct InfoPage {
    view: Arc<InfoView>,
}

impl InfoPage {
    pub fn new(wallet_id: WalletId, queries: Arc<dyn WalletQueries>, redraw: RedrawHandle) -> Self {
        Self {
            view: Arc::new(InfoView {
                wallet_id,
                queries,
                redraw,
                state: Mutex::new(InfoPageState::default()),
            }),
        }
    }

    pub fn state(&self) -> InfoPageState {
        lock(&self.view.state).clone()
    }
}

#[async_trait]
impl Page for InfoPage {
    fn id(&self) -> &'static str {
        INFO_PAGE_ID
    }

    async fn on_navigated_to(&mut self, _hub: &NotificationHub) {
        self.view.refresh();
    }

    async fn on_navigated_from(&mut self) {}

    fn tx_notifiable(&self) -> Option<Arc<dyn TxNotifiable>> {
        Some(self.view.clone())
    }
}
