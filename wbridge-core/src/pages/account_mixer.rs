use super::lock;
use crate::consumers::{HandlerError, NotificationHandler, Redraw};
use crate::events::{MixerEvent, Notification, NotificationDomain};
use crate::lifecycle::{NotificationHub, Page, PageContext};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{MixerRunStatus, WalletId};

pub const ACCOUNT_MIXER_PAGE_ID: &str = "AccountMixer";

const MIXER_STARTED_TOAST: &str = "Mixer start Successfully";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixerPageState {
    pub mixer_active: bool,
    /// Set once a mixer run ended while the page was visible.
    pub mixer_completed: bool,
    pub toasts: Vec<String>,
}

/// Controls and status of the account mixer of one wallet.
pub struct AccountMixerPage {
    wallet_id: WalletId,
    queries: Arc<dyn WalletQueries>,
    state: Arc<Mutex<MixerPageState>>,
    ctx: Option<PageContext>,
}

impl AccountMixerPage {
    pub fn new(wallet_id: WalletId, queries: Arc<dyn WalletQueries>) -> Self {
        Self {
            wallet_id,
            queries,
            state: Arc::new(Mutex::new(MixerPageState::default())),
            ctx: None,
        }
    }

    pub fn state(&self) -> MixerPageState {
        lock(&self.state).clone()
    }
}

#[async_trait]
impl Page for AccountMixerPage {
    fn id(&self) -> &'static str {
        ACCOUNT_MIXER_PAGE_ID
    }

    async fn on_navigated_to(&mut self, hub: &NotificationHub) {
        match self.queries.is_account_mixer_active(self.wallet_id) {
            Ok(active) => lock(&self.state).mixer_active = active,
            Err(e) => warn!(wallet_id = self.wallet_id, error = %e, "Failed to read mixer status"),
        }

        let mut ctx = PageContext::new(ACCOUNT_MIXER_PAGE_ID);
        let handler = MixerHandler {
            state: Arc::clone(&self.state),
        };
        if let Err(e) = hub
            .attach(&mut ctx, NotificationDomain::AccountMixer, handler)
            .await
        {
            error!(page = ACCOUNT_MIXER_PAGE_ID, error = %e, "Error adding account mixer notification listener");
        }
        self.ctx = Some(ctx);
    }

    async fn on_navigated_from(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.detach().await;
        }
    }
}

struct MixerHandler {
    state: Arc<Mutex<MixerPageState>>,
}

#[async_trait]
impl NotificationHandler for MixerHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        let domain = notification.domain();
        let Notification::Mixer(MixerEvent { run_status }) = notification else {
            return Err(HandlerError::Unexpected(domain));
        };

        let mut state = lock(&self.state);
        match run_status {
            MixerRunStatus::Started => {
                state.mixer_active = true;
                state.toasts.push(MIXER_STARTED_TOAST.to_owned());
            }
            MixerRunStatus::Ended => {
                state.mixer_active = false;
                state.mixer_completed = true;
            }
        }
        Ok(Redraw::Requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mixer_run_updates_state() {
        let state = Arc::new(Mutex::new(MixerPageState::default()));
        let mut handler = MixerHandler {
            state: Arc::clone(&state),
        };

        let started = Notification::Mixer(MixerEvent {
            run_status: MixerRunStatus::Started,
        });
        assert_eq!(handler.handle(started).await.unwrap(), Redraw::Requested);
        assert_eq!(lock(&state).toasts, vec![MIXER_STARTED_TOAST.to_owned()]);

        let ended = Notification::Mixer(MixerEvent {
            run_status: MixerRunStatus::Ended,
        });
        handler.handle(ended).await.unwrap();
        let state = lock(&state).clone();
        assert!(state.mixer_completed);
        assert!(!state.mixer_active);
    }
}
