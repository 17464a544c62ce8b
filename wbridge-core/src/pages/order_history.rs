use super::lock;
use crate::consumers::{HandlerError, NotificationHandler, Redraw};
use crate::events::{Notification, NotificationDomain, OrderSyncEvent};
use crate::lifecycle::{NotificationHub, Page, PageContext};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::{Order, OrderSyncStatus};

pub const ORDER_HISTORY_PAGE_ID: &str = "OrderHistory";

const ORDERS_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderHistoryState {
    pub orders: Vec<Order>,
    pub is_syncing: bool,
}

/// Swap orders, newest first.
pub struct OrderHistoryPage {
    queries: Arc<dyn WalletQueries>,
    state: Arc<Mutex<OrderHistoryState>>,
    ctx: Option<PageContext>,
}

impl OrderHistoryPage {
    pub fn new(queries: Arc<dyn WalletQueries>) -> Self {
        Self {
            queries,
            state: Arc::new(Mutex::new(OrderHistoryState::default())),
            ctx: None,
        }
    }

    pub fn state(&self) -> OrderHistoryState {
        lock(&self.state).clone()
    }
}

fn fetch_orders(
    queries: &dyn WalletQueries,
    state: &Mutex<OrderHistoryState>,
) -> Result<(), HandlerError> {
    let orders = queries.orders(0, ORDERS_PAGE_SIZE)?;
    lock(state).orders = orders;
    Ok(())
}

#[async_trait]
impl Page for OrderHistoryPage {
    fn id(&self) -> &'static str {
        ORDER_HISTORY_PAGE_ID
    }

    async fn on_navigated_to(&mut self, hub: &NotificationHub) {
        if let Err(e) = fetch_orders(self.queries.as_ref(), &self.state) {
            warn!(error = %e, "Failed to load orders");
        }

        let mut ctx = PageContext::new(ORDER_HISTORY_PAGE_ID);
        let handler = OrderHandler {
            queries: Arc::clone(&self.queries),
            state: Arc::clone(&self.state),
        };
        if let Err(e) = hub.attach(&mut ctx, NotificationDomain::Order, handler).await {
            error!(page = ORDER_HISTORY_PAGE_ID, error = %e, "Error adding order notification listener");
        }
        self.ctx = Some(ctx);
    }

    async fn on_navigated_from(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.detach().await;
        }
    }
}

struct OrderHandler {
    queries: Arc<dyn WalletQueries>,
    state: Arc<Mutex<OrderHistoryState>>,
}

#[async_trait]
impl NotificationHandler for OrderHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        let domain = notification.domain();
        let Notification::Order(OrderSyncEvent { status }) = notification else {
            return Err(HandlerError::Unexpected(domain));
        };

        match status {
            OrderSyncStatus::Started => {
                lock(&self.state).is_syncing = true;
                Ok(Redraw::Skip)
            }
            OrderSyncStatus::Failed => {
                lock(&self.state).is_syncing = false;
                Ok(Redraw::Requested)
            }
            OrderSyncStatus::Synced => {
                lock(&self.state).is_syncing = false;
                fetch_orders(self.queries.as_ref(), &self.state)?;
                Ok(Redraw::Requested)
            }
        }
    }
}
