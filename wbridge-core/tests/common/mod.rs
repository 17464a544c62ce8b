#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use wbridge_core::config::ChannelCapacities;
use wbridge_core::consumers::{FnHandler, Redraw, handler_fn};
use wbridge_core::engine::InMemoryEngine;
use wbridge_core::events::Notification;
use wbridge_core::lifecycle::NotificationHub;
use wbridge_core::redraw::RedrawHandle;
use wbridge_sdk::objects::{Asset, Transaction, TxDirection, TxType, WalletId, WalletInfo};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub type Seen = Arc<Mutex<Vec<Notification>>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wbridge_core=debug")
        .with_test_writer()
        .try_init();
}

pub fn hub(engine: &Arc<InMemoryEngine>) -> NotificationHub {
    NotificationHub::new(
        engine.clone(),
        ChannelCapacities::default(),
        RedrawHandle::new(),
    )
}

/// Handler that records every notification it receives.
pub fn collecting_handler() -> (
    FnHandler<impl FnMut(Notification) -> Redraw + Send + 'static>,
    Seen,
) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = handler_fn(move |notification| {
        sink.lock().unwrap().push(notification);
        Redraw::Requested
    });
    (handler, seen)
}

/// Run engine calls on a blocking thread, like the engine's own workers.
pub async fn emit<F>(engine: &Arc<InMemoryEngine>, f: F)
where
    F: FnOnce(&InMemoryEngine) + Send + 'static,
{
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .unwrap();
}

/// Poll `condition` until it holds, panicking after [`WAIT_TIMEOUT`].
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

pub fn wallet(id: WalletId, name: &str) -> WalletInfo {
    WalletInfo {
        id,
        name: name.to_owned(),
        asset: Asset::Dcr,
        balance: 0,
        watching_only: false,
    }
}

pub fn received(wallet_id: WalletId, hash: &str, amount: i64) -> Transaction {
    Transaction {
        wallet_id,
        hash: hash.to_owned(),
        tx_type: TxType::Regular,
        direction: TxDirection::Received,
        amount,
        fee: 0,
        vote_reward: 0,
        block_height: -1,
        timestamp: 1_700_000_000,
    }
}
