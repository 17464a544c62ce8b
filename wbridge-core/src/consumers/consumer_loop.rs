//! ConsumerLoop.
//!
//! The ConsumerLoop is responsible for:
//! - Receiving notifications from one subscription while its page is visible
//! - Dispatching each one to the page handler and requesting redraws
//! - Tearing the registration down when the page context is cancelled, the
//!   registry evicts it, or the channel closes
//!
//! Teardown drains before it exits: the engine unregister runs on a
//! blocking thread while the loop keeps receiving, so a producer blocked on
//! a full channel always makes progress. Only then is the channel closed,
//! whatever is still buffered is dispatched, and the entry is removed.

use super::handler::{NotificationHandler, Redraw};
use crate::events::Notification;
use crate::listeners::Subscription;
use crate::redraw::RedrawHandle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Resolves once `evict_rx` turns `true` or its sender is gone.
async fn evicted(evict_rx: &mut watch::Receiver<bool>) {
    let _ = evict_rx.wait_for(|evict| *evict).await;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    Evicted,
    ChannelClosed,
}

/// Drains one subscription for the lifetime of one page visibility period.
pub struct ConsumerLoop<H> {
    subscription: Subscription,
    handler: H,
    redraw: RedrawHandle,
}

impl<H: NotificationHandler> ConsumerLoop<H> {
    pub fn new(subscription: Subscription, handler: H, redraw: RedrawHandle) -> Self {
        Self {
            subscription,
            handler,
            redraw,
        }
    }

    /// Run until `shutdown_rx` turns `true` (or its sender is dropped), the
    /// registry evicts the subscription, or the channel closes. Teardown
    /// runs exactly once before returning.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let Self {
            mut subscription,
            mut handler,
            redraw,
        } = self;
        let handle = subscription.handle().clone();
        let mut evict_rx = subscription.eviction_signal();

        info!(
            domain = %handle.domain(),
            consumer = handle.name(),
            "ConsumerLoop started"
        );

        let reason = if *shutdown_rx.borrow_and_update() {
            StopReason::Cancelled
        } else {
            loop {
                tokio::select! {
                    biased;

                    // Page cancellation has highest priority.
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break StopReason::Cancelled;
                        }
                    }

                    _ = evicted(&mut evict_rx) => {
                        break StopReason::Evicted;
                    }

                    received = subscription.recv() => match received {
                        Some(notification) => {
                            Self::dispatch(&mut handler, &redraw, handle.name(), notification).await;
                        }
                        None => break StopReason::ChannelClosed,
                    },
                }
            }
        };

        debug!(
            domain = %handle.domain(),
            consumer = handle.name(),
            ?reason,
            "ConsumerLoop stopping, tearing down"
        );

        // -- Teardown ---------------------------------------------------
        if let Err(e) = subscription.begin_detach() {
            warn!(
                domain = %handle.domain(),
                consumer = handle.name(),
                error = %e,
                "Unexpected registration state during teardown"
            );
        }

        let mut unregister = subscription.unregister_from_engine();
        let mut channel_open = reason != StopReason::ChannelClosed;
        loop {
            tokio::select! {
                biased;

                joined = &mut unregister => {
                    if let Err(e) = joined {
                        error!(
                            domain = %handle.domain(),
                            consumer = handle.name(),
                            error = %e,
                            "Engine unregister task failed"
                        );
                    }
                    break;
                }

                received = subscription.recv(), if channel_open => match received {
                    Some(notification) => {
                        Self::dispatch(&mut handler, &redraw, handle.name(), notification).await;
                    }
                    None => channel_open = false,
                },
            }
        }

        subscription.close();
        while let Some(notification) = subscription.recv().await {
            Self::dispatch(&mut handler, &redraw, handle.name(), notification).await;
        }
        subscription.finish();

        info!(
            domain = %handle.domain(),
            consumer = handle.name(),
            "ConsumerLoop shutdown complete"
        );
    }

    async fn dispatch(
        handler: &mut H,
        redraw: &RedrawHandle,
        consumer: &str,
        notification: Notification,
    ) {
        let domain = notification.domain();
        debug!(consumer, %domain, ?notification, "Received notification");

        match handler.handle(notification).await {
            Ok(Redraw::Requested) => redraw.request(),
            Ok(Redraw::Skip) => {}
            Err(e) => {
                error!(consumer, %domain, error = %e, "Failed to handle notification");
            }
        }
    }
}
