use super::lock;
use crate::config::{ConfigStore, NotificationPrefs};
use crate::consumers::{HandlerError, NotificationHandler, Redraw};
use crate::events::{Notification, NotificationDomain, ProposalSyncEvent};
use crate::lifecycle::{NotificationHub, Page, PageContext};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{Proposal, ProposalStatus};

pub const PROPOSALS_PAGE_ID: &str = "Proposals";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalsPageState {
    pub proposals: Vec<Proposal>,
    pub sync_completed: bool,
    pub is_syncing: bool,
}

/// Governance proposals list.
pub struct ProposalsPage {
    queries: Arc<dyn WalletQueries>,
    prefs: ConfigStore<NotificationPrefs>,
    state: Arc<Mutex<ProposalsPageState>>,
    ctx: Option<PageContext>,
}

impl ProposalsPage {
    pub fn new(queries: Arc<dyn WalletQueries>, prefs: ConfigStore<NotificationPrefs>) -> Self {
        Self {
            queries,
            prefs,
            state: Arc::new(Mutex::new(ProposalsPageState::default())),
            ctx: None,
        }
    }

    pub fn state(&self) -> ProposalsPageState {
        lock(&self.state).clone()
    }
}

fn fetch_proposals(
    queries: &dyn WalletQueries,
    state: &Mutex<ProposalsPageState>,
) -> Result<(), HandlerError> {
    let mut proposals = queries.proposals()?;
    proposals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    lock(state).proposals = proposals;
    Ok(())
}

#[async_trait]
impl Page for ProposalsPage {
    fn id(&self) -> &'static str {
        PROPOSALS_PAGE_ID
    }

    async fn on_navigated_to(&mut self, hub: &NotificationHub) {
        if !self.prefs.read().await.governance_api {
            debug!(page = PROPOSALS_PAGE_ID, "Governance API disabled, not listening");
            return;
        }

        if let Err(e) = fetch_proposals(self.queries.as_ref(), &self.state) {
            warn!(error = %e, "Failed to load proposals");
        }
        {
            let mut state = lock(&self.state);
            state.is_syncing = !state.sync_completed;
        }

        let mut ctx = PageContext::new(PROPOSALS_PAGE_ID);
        let handler = ProposalsHandler {
            queries: Arc::clone(&self.queries),
            state: Arc::clone(&self.state),
        };
        if let Err(e) = hub.attach(&mut ctx, NotificationDomain::Proposal, handler).await {
            error!(page = PROPOSALS_PAGE_ID, error = %e, "Error adding politeia notification listener");
        }
        self.ctx = Some(ctx);
    }

    async fn on_navigated_from(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.detach().await;
        }
    }
}

struct ProposalsHandler {
    queries: Arc<dyn WalletQueries>,
    state: Arc<Mutex<ProposalsPageState>>,
}

#[async_trait]
impl NotificationHandler for ProposalsHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        let domain = notification.domain();
        let Notification::Proposal(ProposalSyncEvent { status, .. }) = notification else {
            return Err(HandlerError::Unexpected(domain));
        };
        if status != ProposalStatus::Synced {
            return Ok(Redraw::Skip);
        }

        {
            let mut state = lock(&self.state);
            state.sync_completed = true;
            state.is_syncing = false;
        }
        fetch_proposals(self.queries.as_ref(), &self.state)?;
        Ok(Redraw::Requested)
    }
}
