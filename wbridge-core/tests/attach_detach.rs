mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use common::{collecting_handler, eventually, hub, init_tracing};
use wbridge_core::engine::{InMemoryEngine, RegistrationCounts};
use wbridge_core::events::NotificationDomain;
use wbridge_core::lifecycle::{Attachment, PageContext};
use wbridge_core::consumers::ConsumerLoop;
use wbridge_core::listeners::{AddOutcome, RegistrationState, RegistryError, RegistryStats};
use wbridge_sdk::EngineError;

const PAGE: &str = "Transactions";

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_attach_under_same_name_is_a_no_op() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (first, _) = collecting_handler();
    let (second, _) = collecting_handler();
    assert!(matches!(
        hub.attach(&mut ctx, NotificationDomain::TxAndBlock, first).await?,
        Attachment::Started
    ));
    let existing = hub
        .attach(&mut ctx, NotificationDomain::TxAndBlock, second)
        .await?;

    let Attachment::Existing(handle) = existing else {
        panic!("expected the existing registration");
    };
    assert_eq!(handle.name(), PAGE);
    assert_eq!(ctx.running_loops(), 1);
    assert_eq!(
        engine.registration_counts(NotificationDomain::TxAndBlock, PAGE),
        RegistrationCounts {
            added: 1,
            removed: 0
        }
    );

    ctx.detach().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detach_unregisters_and_closes_exactly_once() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    let registry = hub.registry(NotificationDomain::Order).clone();

    let mut ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::Order, handler)
        .await?;
    assert_eq!(registry.state(PAGE), RegistrationState::Active);
    assert!(engine.is_listening(NotificationDomain::Order, PAGE));

    ctx.detach().await;

    assert_eq!(registry.state(PAGE), RegistrationState::Unregistered);
    assert!(registry.is_empty());
    assert!(!engine.is_listening(NotificationDomain::Order, PAGE));
    assert_eq!(
        registry.stats(),
        RegistryStats {
            registered: 1,
            unregistered: 1,
            channels_closed: 1
        }
    );
    assert_eq!(
        engine.registration_counts(NotificationDomain::Order, PAGE),
        RegistrationCounts {
            added: 1,
            removed: 1
        }
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attach_detach_cycles_keep_one_registration() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let hub = hub.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                let mut ctx = PageContext::new(PAGE);
                let (handler, _) = collecting_handler();
                hub.attach(&mut ctx, NotificationDomain::SyncProgress, handler)
                    .await?;
                tokio::task::yield_now().await;
                ctx.detach().await;
            }
            Ok::<_, RegistryError>(())
        }));
    }
    // An engine-side duplicate would surface here as ListenerExists.
    for joined in join_all(tasks).await {
        joined??;
    }

    let registry = hub.registry(NotificationDomain::SyncProgress);
    assert!(registry.is_empty());
    assert_eq!(engine.listener_count(NotificationDomain::SyncProgress), 0);
    let counts = engine.registration_counts(NotificationDomain::SyncProgress, PAGE);
    assert_eq!(counts.added, counts.removed);
    assert_eq!(registry.stats().registered, counts.added);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engine_rejection_is_returned_and_leaves_no_entry() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    engine.reject_registrations(true);

    let mut ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    let err = hub
        .attach(&mut ctx, NotificationDomain::Proposal, handler)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Engine {
            domain: NotificationDomain::Proposal,
            source: EngineError::Rejected(_),
            ..
        }
    ));
    assert!(!hub.registry(NotificationDomain::Proposal).is_registered(PAGE));
    assert_eq!(ctx.running_loops(), 0);

    engine.reject_registrations(false);
    let (handler, _) = collecting_handler();
    assert!(matches!(
        hub.attach(&mut ctx, NotificationDomain::Proposal, handler)
            .await?,
        Attachment::Started
    ));
    ctx.detach().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn registry_remove_evicts_the_running_loop() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    let registry = hub.registry(NotificationDomain::AccountMixer).clone();

    let mut ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::AccountMixer, handler)
        .await?;

    registry.remove(PAGE).await;
    assert!(!registry.is_registered(PAGE));
    assert!(!engine.is_listening(NotificationDomain::AccountMixer, PAGE));

    // Removing an absent name is a no-op.
    registry.remove(PAGE).await;

    ctx.detach().await;
    assert_eq!(registry.stats().unregistered, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_the_context_stops_its_loops() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);

    let mut ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    hub.attach(&mut ctx, NotificationDomain::TxAndBlock, handler)
        .await?;
    drop(ctx);

    let registry = hub.registry(NotificationDomain::TxAndBlock).clone();
    eventually(|| registry.is_empty()).await;
    assert!(!engine.is_listening(NotificationDomain::TxAndBlock, PAGE));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn aborted_loop_releases_its_registration() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    let hub = hub(&engine);
    let registry = hub.registry(NotificationDomain::Order).clone();

    let AddOutcome::Registered(subscription) = registry.add(PAGE, 2).await? else {
        panic!("expected a fresh registration");
    };
    let ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    let consumer = ConsumerLoop::new(subscription, handler, hub.redraw().clone());
    let task = tokio::spawn(consumer.run(ctx.cancellation()));

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(!registry.is_registered(PAGE));
    assert_eq!(
        engine.registration_counts(NotificationDomain::Order, PAGE),
        RegistrationCounts {
            added: 1,
            removed: 1
        }
    );
    assert_eq!(registry.stats().channels_closed, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loop_aborted_during_engine_unregister_frees_the_name_afterwards() -> Result<()> {
    init_tracing();
    let engine = Arc::new(InMemoryEngine::new());
    engine.set_remove_delay(Some(Duration::from_millis(300)));
    let hub = hub(&engine);
    let registry = hub.registry(NotificationDomain::Order).clone();

    let AddOutcome::Registered(subscription) = registry.add(PAGE, 2).await? else {
        panic!("expected a fresh registration");
    };
    let ctx = PageContext::new(PAGE);
    let (handler, _) = collecting_handler();
    let consumer = ConsumerLoop::new(subscription, handler, hub.redraw().clone());
    let task = tokio::spawn(consumer.run(ctx.cancellation()));

    ctx.cancel();
    eventually(|| registry.state(PAGE) == RegistrationState::Detaching).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    // The engine still holds the listener, so the name stays taken.
    assert!(engine.is_listening(NotificationDomain::Order, PAGE));
    assert!(registry.is_registered(PAGE));

    eventually(|| !registry.is_registered(PAGE)).await;
    assert!(!engine.is_listening(NotificationDomain::Order, PAGE));
    assert_eq!(
        registry.stats(),
        RegistryStats {
            registered: 1,
            unregistered: 1,
            channels_closed: 1
        }
    );

    engine.set_remove_delay(None);
    let AddOutcome::Registered(again) = registry.add(PAGE, 2).await? else {
        panic!("expected the name to be free again");
    };
    again.finish();
    assert_eq!(
        engine.registration_counts(NotificationDomain::Order, PAGE),
        RegistrationCounts {
            added: 2,
            removed: 2
        }
    );
    Ok(())
}
