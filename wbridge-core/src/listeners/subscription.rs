//! The consumer side of one listener registration.

use super::registry::{ListenerRegistry, RegistrationHandle, RegistrationState, RegistryError};
use crate::events::{Notification, NotificationReceiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Progress of the engine unregister for one registration.
#[derive(Default)]
struct EngineRemoval {
    claimed: bool,
    done: bool,
    /// Receiver left behind by a subscription dropped while the engine
    /// unregister was still running. The removal task closes it and drops
    /// the registry entry once the engine call returns.
    parked: Option<NotificationReceiver>,
}

type SharedRemoval = Arc<Mutex<EngineRemoval>>;

fn lock(removal: &Mutex<EngineRemoval>) -> MutexGuard<'_, EngineRemoval> {
    removal.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the receiving end of a registration's channel.
///
/// Teardown happens in four steps, driven by the owner:
///
/// 1. [`begin_detach`](Subscription::begin_detach): `Active -> Detaching`
/// 2. [`unregister_from_engine`](Subscription::unregister_from_engine):
///    the engine stops calling the adapter
/// 3. [`close`](Subscription::close): pending and future sends fail, the
///    buffer can still be drained
/// 4. [`finish`](Subscription::finish): the registry entry is removed
///
/// Dropping a subscription that was not finished releases it without the
/// drain, in the same order. If the engine unregister is already running
/// on a blocking thread, closing and removal are handed to that thread, so
/// the name is never reported free while the engine still holds it.
pub struct Subscription {
    handle: RegistrationHandle,
    receiver: Option<NotificationReceiver>,
    evict_rx: watch::Receiver<bool>,
    registry: ListenerRegistry,
    removal: SharedRemoval,
    closed: bool,
    finished: bool,
}

impl Subscription {
    pub(super) fn new(
        handle: RegistrationHandle,
        receiver: NotificationReceiver,
        evict_rx: watch::Receiver<bool>,
        registry: ListenerRegistry,
    ) -> Self {
        Self {
            handle,
            receiver: Some(receiver),
            evict_rx,
            registry,
            removal: SharedRemoval::default(),
            closed: false,
            finished: false,
        }
    }

    pub fn handle(&self) -> &RegistrationHandle {
        &self.handle
    }

    /// Receive the next notification. Cancel safe.
    pub async fn recv(&mut self) -> Option<Notification> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    /// Signal that turns `true` once the registry asks this subscription
    /// to tear down.
    pub fn eviction_signal(&self) -> watch::Receiver<bool> {
        self.evict_rx.clone()
    }

    pub fn begin_detach(&mut self) -> Result<(), RegistryError> {
        self.registry
            .transition(&self.handle, RegistrationState::Detaching)
    }

    /// Unregister the adapter from the engine on a blocking thread.
    ///
    /// The engine call may block (for instance behind a sync cycle), so it
    /// runs off the async worker while the owner keeps draining. Calling
    /// this again after the unregister was claimed does nothing.
    pub fn unregister_from_engine(&self) -> JoinHandle<()> {
        let task = claim(&self.removal).then(|| EngineRemovalTask {
            registry: self.registry.clone(),
            handle: self.handle.clone(),
            removal: Arc::clone(&self.removal),
        });
        tokio::task::spawn_blocking(move || {
            if let Some(task) = task {
                task.run();
            }
        })
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Some(receiver) = self.receiver.as_mut() {
                receiver.close();
            }
            self.registry.record_channel_closed();
        }
    }

    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if claim(&self.removal) {
            self.registry.unregister_from_engine(self.handle.name());
            lock(&self.removal).done = true;
        } else {
            let mut removal = lock(&self.removal);
            if !removal.done {
                debug!(
                    domain = %self.handle.domain(),
                    consumer = %self.handle.name(),
                    "Engine unregister in progress, deferring release"
                );
                removal.parked = self.receiver.take();
                self.closed = true;
                return;
            }
        }

        self.close();
        self.registry.forget(&self.handle);
    }
}

/// Take the right to unregister from the engine. True for the first caller.
fn claim(removal: &Mutex<EngineRemoval>) -> bool {
    let mut removal = lock(removal);
    !std::mem::replace(&mut removal.claimed, true)
}

/// Engine unregister running on a blocking thread.
///
/// Completion is recorded on drop, so a panicking engine call still lets a
/// parked release finish.
struct EngineRemovalTask {
    registry: ListenerRegistry,
    handle: RegistrationHandle,
    removal: SharedRemoval,
}

impl EngineRemovalTask {
    fn run(self) {
        self.registry.unregister_from_engine(self.handle.name());
    }
}

impl Drop for EngineRemovalTask {
    fn drop(&mut self) {
        let parked = {
            let mut removal = lock(&self.removal);
            removal.done = true;
            removal.parked.take()
        };
        if let Some(mut receiver) = parked {
            receiver.close();
            self.registry.record_channel_closed();
            self.registry.forget(&self.handle);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                domain = %self.handle.domain(),
                consumer = %self.handle.name(),
                "Subscription dropped before teardown, releasing"
            );
            self.release();
        }
    }
}
