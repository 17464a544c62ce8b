mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use common::{WAIT_TIMEOUT, collecting_handler, emit, eventually, hub, init_tracing};
use tokio::sync::{Notify, Semaphore};
use wbridge_core::consumers::{HandlerError, NotificationHandler, Redraw};
use wbridge_core::engine::InMemoryEngine;
use wbridge_core::events::{BlockEvent, Notification, NotificationDomain, TxEvent, TxEventKind};
use wbridge_core::lifecycle::PageContext;

const PAGE: &str = "Main";

fn block_heights(seen: &[Notification]) -> Vec<i32> {
    seen.iter()
        .filter_map(|notification| match notification {
            Notification::Block(BlockEvent { block_height, .. }) => Some(*block_height),
            _ => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_are_delivered_in_order_exactly_once() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, seen) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    // Far more than the channel holds, so the producer hits backpressure.
    emit(&engine, |engine| {
        for height in 0..200 {
            engine.emit_block_attached(1, height);
        }
    })
    .await;

    eventually(|| seen.lock().unwrap().len() == 200).await;
    ctx.detach().await;

    let heights = block_heights(&seen.lock().unwrap());
    assert_eq!(heights, (0..200).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn block_is_seen_before_the_confirmation_it_caused() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, seen) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    emit(&engine, |engine| {
        engine.emit_block_attached(1, 10);
        engine.emit_transaction_confirmed(1, "abc", 10);
    })
    .await;
    eventually(|| seen.lock().unwrap().len() == 2).await;
    ctx.detach().await;

    let seen = seen.lock().unwrap();
    assert!(matches!(seen[0], Notification::Block(BlockEvent { block_height: 10, .. })));
    assert!(matches!(
        &seen[1],
        Notification::Tx(TxEvent {
            kind: TxEventKind::Confirmed { hash },
            ..
        }) if hash == "abc"
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_transaction_is_dropped() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, seen) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    emit(&engine, |engine| {
        engine.emit_raw_transaction("not a transaction");
        engine.emit_block_attached(3, 7);
    })
    .await;
    eventually(|| !seen.lock().unwrap().is_empty()).await;
    ctx.detach().await;

    assert_eq!(block_heights(&seen.lock().unwrap()), vec![7]);
    assert_eq!(seen.lock().unwrap().len(), 1);
    Ok(())
}

/// Holds every notification until a permit is released.
struct GatedHandler {
    gate: Arc<Semaphore>,
    entered: Arc<Notify>,
    handled: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationHandler for GatedHandler {
    async fn handle(&mut self, _notification: Notification) -> Result<Redraw, HandlerError> {
        self.entered.notify_one();
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(Redraw::Skip)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_channel_blocks_the_engine_thread() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    assert_eq!(hub.capacities().tx_and_block, 4);

    let gate = Arc::new(Semaphore::new(0));
    let entered = Arc::new(Notify::new());
    let handled = Arc::new(AtomicUsize::new(0));
    let mut ctx = PageContext::new(PAGE);
    let handler = GatedHandler {
        gate: Arc::clone(&gate),
        entered: Arc::clone(&entered),
        handled: Arc::clone(&handled),
    };
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    let sent = Arc::new(AtomicUsize::new(0));
    let producer = {
        let engine = Arc::clone(&engine);
        let sent = Arc::clone(&sent);
        std::thread::spawn(move || {
            for height in 0..6 {
                engine.emit_block_attached(1, height);
                sent.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    // One notification is in the handler and four fill the buffer, so the
    // sixth send has to wait.
    tokio::time::timeout(WAIT_TIMEOUT, entered.notified()).await?;
    eventually(|| sent.load(Ordering::SeqCst) == 5).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sent.load(Ordering::SeqCst), 5);

    gate.add_permits(6);
    eventually(|| handled.load(Ordering::SeqCst) == 6).await;
    assert!(producer.join().is_ok());
    assert_eq!(sent.load(Ordering::SeqCst), 6);

    ctx.detach().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn buffered_notifications_are_handled_before_detach_returns() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let gate = Arc::new(Semaphore::new(0));
    let entered = Arc::new(Notify::new());
    let handled = Arc::new(AtomicUsize::new(0));
    let mut ctx = PageContext::new(PAGE);
    let handler = GatedHandler {
        gate: Arc::clone(&gate),
        entered: Arc::clone(&entered),
        handled: Arc::clone(&handled),
    };
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    // One notification parks in the handler, the other four fill the buffer.
    let entered_first = entered.notified();
    emit(&engine, |engine| {
        for height in 0..5 {
            engine.emit_block_attached(1, height);
        }
    })
    .await;
    tokio::time::timeout(WAIT_TIMEOUT, entered_first).await?;
    assert_eq!(handled.load(Ordering::SeqCst), 0);

    let detach = tokio::spawn(ctx.detach());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!detach.is_finished());

    gate.add_permits(5);
    tokio::time::timeout(WAIT_TIMEOUT, detach).await??;

    assert_eq!(handled.load(Ordering::SeqCst), 5);
    assert!(!engine.is_listening(NotificationDomain::TxAndBlock, PAGE));
    assert!(hub.registry(NotificationDomain::TxAndBlock).is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callbacks_from_a_runtime_task_apply_backpressure() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, seen) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    let producer = Arc::clone(&engine);
    tokio::spawn(async move {
        for height in 0..20 {
            producer.emit_block_attached(1, height);
        }
    })
    .await?;

    eventually(|| seen.lock().unwrap().len() == 20).await;
    ctx.detach().await;
    assert_eq!(block_heights(&seen.lock().unwrap()), (0..20).collect::<Vec<_>>());
    Ok(())
}

/// Takes a while per notification and records what it saw.
struct SlowHandler {
    delay: Duration,
    heights: Arc<std::sync::Mutex<Vec<i32>>>,
    in_flight: Arc<AtomicBool>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationHandler for SlowHandler {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        self.in_flight.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if let Notification::Block(BlockEvent { block_height, .. }) = notification {
            self.heights.lock().unwrap().push(block_height);
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(Redraw::Requested)
    }
}

type SlowProbes = (
    Arc<std::sync::Mutex<Vec<i32>>>,
    Arc<AtomicBool>,
    Arc<AtomicUsize>,
);

fn slow_handler(delay: Duration) -> (SlowHandler, SlowProbes) {
    let heights = Arc::new(std::sync::Mutex::new(Vec::new()));
    let in_flight = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicUsize::new(0));
    let handler = SlowHandler {
        delay,
        heights: Arc::clone(&heights),
        in_flight: Arc::clone(&in_flight),
        finished: Arc::clone(&finished),
    };
    (handler, (heights, in_flight, finished))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detach_with_a_blocked_producer_does_not_deadlock() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    engine.set_remove_delay(Some(Duration::from_millis(50)));
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, (heights, _, _)) = slow_handler(Duration::from_millis(10));
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    let producer = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || {
            for height in 0..50 {
                engine.emit_block_attached(1, height);
            }
        })
    };
    eventually(|| heights.lock().unwrap().len() >= 2).await;

    tokio::time::timeout(WAIT_TIMEOUT, ctx.detach()).await?;
    let joined = tokio::task::spawn_blocking(move || producer.join().is_ok()).await?;
    assert!(joined);

    assert!(!engine.is_listening(NotificationDomain::TxAndBlock, PAGE));
    let heights = heights.lock().unwrap();
    assert!(heights.len() <= 50);
    assert!(heights.windows(2).all(|pair| pair[0] < pair[1]));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn in_flight_handler_completes_before_teardown() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, (_, in_flight, finished)) = slow_handler(Duration::from_millis(150));
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;

    emit(&engine, |engine| engine.emit_block_attached(1, 1)).await;
    eventually(|| in_flight.load(Ordering::SeqCst)).await;

    ctx.detach().await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert!(!in_flight.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn redraw_requests_coalesce_across_a_burst() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    let redraw = hub.redraw().clone();

    let mut ctx = PageContext::new(PAGE);
    let (handler, seen) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::Order, handler)
        .await?;

    emit(&engine, |engine| {
        for _ in 0..10 {
            engine.emit_order_status(wbridge_sdk::objects::OrderSyncStatus::Synced);
        }
    })
    .await;
    eventually(|| redraw.requests() == 10).await;

    assert_eq!(seen.lock().unwrap().len(), 10);
    assert!(redraw.take_pending());
    assert!(!redraw.take_pending());

    ctx.detach().await;
    Ok(())
}
