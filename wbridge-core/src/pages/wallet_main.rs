//! WalletMainPage.
//!
//! The WalletMainPage is responsible for:
//! - Keeping the wallet balance current on sync completion, new
//!   transactions and new blocks
//! - Posting desktop notifications for transactions and proposal updates
//! - Hosting the tab pages and forwarding new transactions to whichever of
//!   them asked for it
//!
//! The engine reports events for every opened wallet; this page only acts
//! on those of its own wallet.

use super::account_mixer::AccountMixerPage;
use super::info::InfoPage;
use super::lock;
use super::proposals::ProposalsPage;
use super::transactions::TransactionsPage;
use crate::config::{ConfigStore, NotificationPrefs};
use crate::consumers::{HandlerError, NotificationHandler, Redraw};
use crate::events::{
    BlockEvent, Notification, NotificationDomain, ProposalSyncEvent, SyncEvent, TxEvent,
    TxEventKind,
};
use crate::lifecycle::{
    NotificationHub, Page, PageContext, PageNavigator, SharedSession, TxForwarder, WalletTab,
};
use crate::notifications::{DesktopNotifier, proposal_notification, transaction_notification};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{Transaction, WalletId};

pub const MAIN_PAGE_ID: &str = "Main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainPageState {
    pub balance: Option<i64>,
    pub selected_tab: WalletTab,
    pub best_block: Option<i32>,
}

/// Everything the main page's handlers need, shared with them.
#[derive(Clone)]
struct MainPageShared {
    wallet_id: WalletId,
    queries: Arc<dyn WalletQueries>,
    prefs: ConfigStore<NotificationPrefs>,
    notifier: Arc<dyn DesktopNotifier>,
    state: Arc<Mutex<MainPageState>>,
}

pub struct WalletMainPage {
    shared: MainPageShared,
    session: SharedSession,
    tabs: Option<PageNavigator>,
    ctx: Option<PageContext>,
}

impl WalletMainPage {
    pub fn new(
        wallet_id: WalletId,
        queries: Arc<dyn WalletQueries>,
        prefs: ConfigStore<NotificationPrefs>,
        notifier: Arc<dyn DesktopNotifier>,
        session: SharedSession,
    ) -> Self {
        let selected_tab = lock(&session).selected_tab(wallet_id);
        Self {
            shared: MainPageShared {
                wallet_id,
                queries,
                prefs,
                notifier,
                state: Arc::new(Mutex::new(MainPageState {
                    balance: None,
                    selected_tab,
                    best_block: None,
                })),
            },
            session,
            tabs: None,
            ctx: None,
        }
    }

    pub fn state(&self) -> MainPageState {
        lock(&self.shared.state).clone()
    }

    /// Id of the tab page currently shown, if the main page is visible.
    pub fn current_tab_page(&self) -> Option<&'static str> {
        self.tabs.as_ref().and_then(PageNavigator::current_id)
    }

    /// Switch tabs and remember the choice for this wallet.
    pub async fn select_tab(&mut self, tab: WalletTab) {
        lock(&self.session).select_tab(self.shared.wallet_id, tab);
        lock(&self.shared.state).selected_tab = tab;
        if self.ctx.is_some() {
            self.show_tab(tab).await;
        }
    }

    async fn show_tab(&mut self, tab: WalletTab) {
        let Some(tabs) = self.tabs.as_mut() else {
            return;
        };
        let page = self.shared.tab_page(tab, tabs);
        tabs.display(page).await;
    }
}

impl MainPageShared {
    fn refresh_balance(&self) -> Result<(), HandlerError> {
        let wallet = self.queries.wallet(self.wallet_id)?;
        lock(&self.state).balance = Some(wallet.balance);
        Ok(())
    }

    async fn attach_all(
        &self,
        hub: &NotificationHub,
        ctx: &mut PageContext,
        forwarder: TxForwarder,
    ) {
        let sync = SyncHandler {
            shared: self.clone(),
        };
        if let Err(e) = hub.attach(ctx, NotificationDomain::SyncProgress, sync).await {
            error!(page = MAIN_PAGE_ID, error = %e, "Error adding sync progress listener");
            return;
        }

        let tx = TxHandler {
            shared: self.clone(),
            forwarder,
        };
        if let Err(e) = hub.attach(ctx, NotificationDomain::TxAndBlock, tx).await {
            error!(page = MAIN_PAGE_ID, error = %e, "Error adding tx and block notification listener");
            return;
        }

        if self.prefs.read().await.governance_api {
            let proposal = ProposalHandler {
                shared: self.clone(),
            };
            if let Err(e) = hub.attach(ctx, NotificationDomain::Proposal, proposal).await {
                error!(page = MAIN_PAGE_ID, error = %e, "Error adding politeia notification listener");
            }
        }
    }

    fn tab_page(&self, tab: WalletTab, tabs: &PageNavigator) -> Box<dyn Page> {
        let redraw = tabs.hub().redraw().clone();
        let queries = Arc::clone(&self.queries);
        match tab {
            WalletTab::Info => Box::new(InfoPage::new(self.wallet_id, queries, redraw)),
            WalletTab::Transactions => {
                Box::new(TransactionsPage::new(self.wallet_id, queries, redraw))
            }
            WalletTab::StakeShuffle => Box::new(AccountMixerPage::new(self.wallet_id, queries)),
            WalletTab::Governance => Box::new(ProposalsPage::new(queries, self.prefs.clone())),
        }
    }
}

#[async_trait]
impl Page for WalletMainPage {
    fn id(&self) -> &'static str {
        MAIN_PAGE_ID
    }

    async fn on_navigated_to(&mut self, hub: &NotificationHub) {
        if let Err(e) = self.shared.refresh_balance() {
            warn!(wallet_id = self.shared.wallet_id, error = %e, "Failed to read balance");
        }

        let tabs = self
            .tabs
            .get_or_insert_with(|| PageNavigator::new(hub.clone()));
        let forwarder = tabs.tx_forwarder();

        let mut ctx = PageContext::new(MAIN_PAGE_ID);
        self.shared.attach_all(hub, &mut ctx, forwarder).await;
        self.ctx = Some(ctx);

        let tab = lock(&self.session).selected_tab(self.shared.wallet_id);
        lock(&self.shared.state).selected_tab = tab;
        self.show_tab(tab).await;
    }

    async fn on_navigated_from(&mut self) {
        if let Some(tabs) = self.tabs.as_mut() {
            tabs.close_current().await;
        }
        if let Some(ctx) = self.ctx.take() {
            ctx.detach().await;
        }
    }
}

// -- Handlers -------------------------------------------------------------

struct SyncHandler {
    shared: MainPageShared,
}

#[async_trait]
impl NotificationHandler for SyncHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        match notification {
            Notification::Sync(SyncEvent::Completed) => {
                self.shared.refresh_balance()?;
                Ok(Redraw::Requested)
            }
            Notification::Sync(event) => {
                debug!(?event, "Sync progress ignored by main page");
                Ok(Redraw::Skip)
            }
            other => Err(HandlerError::Unexpected(other.domain())),
        }
    }
}

struct TxHandler {
    shared: MainPageShared,
    forwarder: TxForwarder,
}

impl TxHandler {
    async fn on_new_transaction(
        &self,
        wallet_id: WalletId,
        transaction: &Transaction,
    ) -> Result<(), HandlerError> {
        self.shared.refresh_balance()?;

        if !self.shared.prefs.read().await.transaction_notifications {
            return Ok(());
        }
        let wallet = self.shared.queries.wallet(wallet_id)?;
        let opened = self.shared.queries.opened_wallets_count();
        if let Some(text) = transaction_notification(transaction, &wallet, opened) {
            self.shared.notifier.notify(&text);
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationHandler for TxHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        match notification {
            Notification::Tx(TxEvent { wallet_id, .. })
            | Notification::Block(BlockEvent { wallet_id, .. })
                if wallet_id != self.shared.wallet_id =>
            {
                Ok(Redraw::Skip)
            }
            Notification::Tx(TxEvent {
                kind: TxEventKind::NewTransaction(transaction),
                wallet_id,
                ..
            }) => {
                let result = self.on_new_transaction(wallet_id, &transaction).await;
                // The tab page refreshes itself even if the balance could not be read.
                self.forwarder.forward(wallet_id);
                result.map(|()| Redraw::Requested)
            }
            Notification::Tx(TxEvent {
                kind: TxEventKind::Confirmed { .. },
                wallet_id,
                ..
            }) => {
                self.forwarder.forward(wallet_id);
                Ok(Redraw::Skip)
            }
            Notification::Block(BlockEvent { block_height, .. }) => {
                if self.shared.prefs.read().await.beep_new_blocks {
                    self.shared.notifier.beep();
                }
                lock(&self.shared.state).best_block = Some(block_height);
                self.shared.refresh_balance()?;
                Ok(Redraw::Requested)
            }
            other => Err(HandlerError::Unexpected(other.domain())),
        }
    }
}

struct ProposalHandler {
    shared: MainPageShared,
}

#[async_trait]
impl NotificationHandler for ProposalHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        let domain = notification.domain();
        let Notification::Proposal(ProposalSyncEvent {
            status,
            proposal_name,
        }) = notification
        else {
            return Err(HandlerError::Unexpected(domain));
        };

        if !self.shared.prefs.read().await.posts_proposal_notifications() {
            return Ok(Redraw::Skip);
        }
        if let Some(text) = proposal_notification(&proposal_name, status) {
            self.shared.notifier.notify(&text);
        }
        Ok(Redraw::Skip)
    }
}
