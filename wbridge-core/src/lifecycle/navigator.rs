use super::hub::NotificationHub;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use wbridge_sdk::objects::WalletId;

/// Pages that want to hear about new transactions of a wallet.
///
/// Implemented by pages hosted inside the wallet main page; the host
/// forwards to whichever page currently offers this capability.
pub trait TxNotifiable: Send + Sync {
    fn on_wallet_tx(&self, wallet_id: WalletId);
}

/// A screen that consumes notifications while visible.
#[async_trait]
pub trait Page: Send {
    fn id(&self) -> &'static str;

    /// Called when the page becomes visible. Attach consumers here.
    ///
    /// Attach failures are the page's to log; a page that could not attach
    /// runs without live updates.
    async fn on_navigated_to(&mut self, hub: &NotificationHub);

    /// Called when the page is hidden. Must detach everything attached in
    /// [`on_navigated_to`](Page::on_navigated_to) before returning.
    async fn on_navigated_from(&mut self);

    fn tx_notifiable(&self) -> Option<Arc<dyn TxNotifiable>> {
        None
    }
}

/// Shared slot holding the transaction capability of the visible page.
///
/// The navigator keeps it current; a parent page's consumer loop reads it
/// to forward new transactions without knowing the page type.
#[derive(Clone, Default)]
pub struct TxForwarder {
    target: Arc<Mutex<Option<Arc<dyn TxNotifiable>>>>,
}

impl TxForwarder {
    fn set(&self, target: Option<Arc<dyn TxNotifiable>>) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    /// Forward to the current page. Returns `false` when it does not care
    /// about transactions.
    pub fn forward(&self, wallet_id: WalletId) -> bool {
        // Cloned out so the page runs unlocked.
        let target = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match target {
            Some(target) => {
                target.on_wallet_tx(wallet_id);
                true
            }
            None => false,
        }
    }
}

/// Shows one page at a time.
pub struct PageNavigator {
    hub: NotificationHub,
    current: Option<Box<dyn Page>>,
    tx_forwarder: TxForwarder,
}

impl PageNavigator {
    pub fn new(hub: NotificationHub) -> Self {
        Self {
            hub,
            current: None,
            tx_forwarder: TxForwarder::default(),
        }
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    pub fn tx_forwarder(&self) -> TxForwarder {
        self.tx_forwarder.clone()
    }

    pub fn current_id(&self) -> Option<&'static str> {
        self.current.as_ref().map(|page| page.id())
    }

    /// Hide the current page, if any, then show `page`.
    pub async fn display(&mut self, mut page: Box<dyn Page>) {
        if let Some(mut previous) = self.current.take() {
            self.tx_forwarder.set(None);
            previous.on_navigated_from().await;
            debug!(page = previous.id(), "Page hidden");
        }

        page.on_navigated_to(&self.hub).await;
        self.tx_forwarder.set(page.tx_notifiable());
        info!(page = page.id(), "Page displayed");
        self.current = Some(page);
    }

    /// Hide the current page and hand it back.
    pub async fn close_current(&mut self) -> Option<Box<dyn Page>> {
        let mut page = self.current.take()?;
        self.tx_forwarder.set(None);
        page.on_navigated_from().await;
        debug!(page = page.id(), "Page closed");
        Some(page)
    }
}
