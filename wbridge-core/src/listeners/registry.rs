//! ListenerRegistry.
//!
//! The ListenerRegistry is responsible for:
//! - Tracking zero or one registration per consumer name, per domain
//! - Registering a fresh [`ListenerAdapter`] with the engine on first add
//! - Driving every registration through its state machine
//! - Asking the owning [`Subscription`] to tear down on `remove`
//!
//! All mutations go through one mutex. Callers that find a registration
//! mid-transition (registering or detaching) wait on a [`Notify`] until the
//! transition completes instead of creating a second registration.

use super::adapter::ListenerAdapter;
use super::subscription::Subscription;
use crate::events::{NotificationDomain, notification_channel};
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wbridge_sdk::{EngineError, NotificationEngine};

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The engine refused the listener
    #[error("engine rejected {domain} listener {name}: {source}")]
    Engine {
        domain: NotificationDomain,
        name: CompactString,
        #[source]
        source: EngineError,
    },

    /// A registration was asked to make a transition its state forbids
    #[error("illegal {domain} listener transition for {name}: {from:?} -> {to:?}")]
    IllegalTransition {
        domain: NotificationDomain,
        name: CompactString,
        from: RegistrationState,
        to: RegistrationState,
    },

    /// The registration is no longer tracked
    #[error("{domain} listener {name} is not registered")]
    NotRegistered {
        domain: NotificationDomain,
        name: CompactString,
    },
}

/// Lifecycle of one registration.
///
/// `Unregistered -> Registering -> Active -> Detaching -> Unregistered`,
/// plus `Registering -> Unregistered` when the engine rejects the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    Unregistered,
    Registering,
    Active,
    Detaching,
}

impl RegistrationState {
    pub fn can_become(self, next: RegistrationState) -> bool {
        use RegistrationState::*;
        matches!(
            (self, next),
            (Unregistered, Registering)
                | (Registering, Active)
                | (Registering, Unregistered)
                | (Active, Detaching)
                | (Detaching, Unregistered)
        )
    }
}

/// Identity of one registration.
///
/// Two registrations made under the same name at different times carry
/// different ids, so a stale subscription can never act on its successor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    id: Uuid,
    domain: NotificationDomain,
    name: CompactString,
}

impl RegistrationHandle {
    fn new(domain: NotificationDomain, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain,
            name: CompactString::from(name),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn domain(&self) -> NotificationDomain {
        self.domain
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Result of [`ListenerRegistry::add`].
pub enum AddOutcome {
    /// A new registration was made; the caller owns its channel.
    Registered(Subscription),
    /// The name already has an active registration; nothing changed.
    AlreadyRegistered(RegistrationHandle),
}

/// Counters for registry activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub registered: u64,
    pub unregistered: u64,
    pub channels_closed: u64,
}

struct Entry {
    handle: RegistrationHandle,
    state: RegistrationState,
    evict_tx: watch::Sender<bool>,
}

struct RegistryInner {
    domain: NotificationDomain,
    engine: Arc<dyn NotificationEngine>,
    entries: Mutex<HashMap<CompactString, Entry>>,
    changed: Notify,
    registered: AtomicU64,
    unregistered: AtomicU64,
    channels_closed: AtomicU64,
}

/// Per-domain map from consumer name to listener registration.
///
/// Cheap to clone; all clones share the same map.
#[derive(Clone)]
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new(domain: NotificationDomain, engine: Arc<dyn NotificationEngine>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                domain,
                engine,
                entries: Mutex::new(HashMap::new()),
                changed: Notify::new(),
                registered: AtomicU64::new(0),
                unregistered: AtomicU64::new(0),
                channels_closed: AtomicU64::new(0),
            }),
        }
    }

    pub fn domain(&self) -> NotificationDomain {
        self.inner.domain
    }

    /// Register a listener for `name`, or return the existing registration.
    ///
    /// On success the caller receives a [`Subscription`] owning the
    /// channel's receiving end and is responsible for tearing it down.
    /// Engine rejections leave no trace in the registry.
    pub async fn add(&self, name: &str, capacity: usize) -> Result<AddOutcome, RegistryError> {
        let domain = self.inner.domain;

        let (handle, evict_rx) = loop {
            // Created before inspecting the map so a transition that
            // completes in between still wakes us.
            let changed = self.inner.changed.notified();
            {
                let mut entries = self.lock();
                match entries.get(name) {
                    Some(entry) if entry.state == RegistrationState::Active => {
                        debug!(%domain, consumer = name, "Listener already registered");
                        return Ok(AddOutcome::AlreadyRegistered(entry.handle.clone()));
                    }
                    Some(entry) => {
                        debug!(
                            %domain,
                            consumer = name,
                            state = ?entry.state,
                            "Waiting for pending listener transition"
                        );
                    }
                    None => {
                        let handle = RegistrationHandle::new(domain, name);
                        let (evict_tx, evict_rx) = watch::channel(false);
                        entries.insert(
                            handle.name.clone(),
                            Entry {
                                handle: handle.clone(),
                                state: RegistrationState::Registering,
                                evict_tx,
                            },
                        );
                        break (handle, evict_rx);
                    }
                }
            }
            changed.await;
        };

        let (sender, receiver) = notification_channel(capacity);
        let adapter = Arc::new(ListenerAdapter::new(domain, name, sender));
        let registration = self.register_with_engine(name, adapter);

        let outcome = match registration {
            Ok(()) => self.transition(&handle, RegistrationState::Active),
            Err(source) => {
                self.lock().remove(name);
                Err(RegistryError::Engine {
                    domain,
                    name: handle.name.clone(),
                    source,
                })
            }
        };
        self.inner.changed.notify_waiters();
        outcome?;

        self.inner.registered.fetch_add(1, Ordering::Relaxed);
        info!(%domain, consumer = name, id = %handle.id, "Listener registered");
        Ok(AddOutcome::Registered(Subscription::new(
            handle,
            receiver,
            evict_rx,
            self.clone(),
        )))
    }

    /// Tear down the registration for `name`, if any.
    ///
    /// The owning subscription performs the teardown; this waits until the
    /// entry is gone.
    pub async fn remove(&self, name: &str) {
        loop {
            let changed = self.inner.changed.notified();
            {
                let entries = self.lock();
                match entries.get(name) {
                    None => return,
                    Some(entry) => {
                        debug!(
                            domain = %self.inner.domain,
                            consumer = name,
                            state = ?entry.state,
                            "Evicting listener"
                        );
                        entry.evict_tx.send_replace(true);
                    }
                }
            }
            changed.await;
        }
    }

    pub fn state(&self, name: &str) -> RegistrationState {
        self.lock()
            .get(name)
            .map(|entry| entry.state)
            .unwrap_or(RegistrationState::Unregistered)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state(name) != RegistrationState::Unregistered
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            registered: self.inner.registered.load(Ordering::Relaxed),
            unregistered: self.inner.unregistered.load(Ordering::Relaxed),
            channels_closed: self.inner.channels_closed.load(Ordering::Relaxed),
        }
    }

    // -- Subscription hooks ---------------------------------------------

    /// Move the registration identified by `handle` to `to`.
    pub(super) fn transition(
        &self,
        handle: &RegistrationHandle,
        to: RegistrationState,
    ) -> Result<(), RegistryError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(handle.name())
            .filter(|entry| entry.handle.id == handle.id)
            .ok_or_else(|| RegistryError::NotRegistered {
                domain: handle.domain,
                name: handle.name.clone(),
            })?;

        if !entry.state.can_become(to) {
            return Err(RegistryError::IllegalTransition {
                domain: handle.domain,
                name: handle.name.clone(),
                from: entry.state,
                to,
            });
        }
        entry.state = to;
        Ok(())
    }

    /// Remove the adapter registered under `name` from the engine.
    ///
    /// The owning subscription guarantees this runs once per registration.
    pub(super) fn unregister_from_engine(&self, name: &str) {
        let engine = &self.inner.engine;
        match self.inner.domain {
            NotificationDomain::SyncProgress => engine.remove_sync_progress_listener(name),
            NotificationDomain::TxAndBlock => engine.remove_tx_and_block_listener(name),
            NotificationDomain::AccountMixer => engine.remove_account_mixer_listener(name),
            NotificationDomain::Proposal => engine.remove_proposal_listener(name),
            NotificationDomain::Order => engine.remove_order_listener(name),
        }
        self.inner.unregistered.fetch_add(1, Ordering::Relaxed);
        debug!(domain = %self.inner.domain, consumer = name, "Listener unregistered from engine");
    }

    pub(super) fn record_channel_closed(&self) {
        self.inner.channels_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the entry for `handle` and wake anyone waiting on it.
    pub(super) fn forget(&self, handle: &RegistrationHandle) {
        {
            let mut entries = self.lock();
            let tracked = entries
                .get(handle.name())
                .is_some_and(|entry| entry.handle.id == handle.id);
            if tracked {
                if let Some(entry) = entries.remove(handle.name()) {
                    if !entry.state.can_become(RegistrationState::Unregistered) {
                        warn!(
                            domain = %handle.domain,
                            consumer = %handle.name,
                            state = ?entry.state,
                            "Releasing listener without a detach"
                        );
                    }
                }
            }
        }
        self.inner.changed.notify_waiters();
        info!(domain = %handle.domain, consumer = %handle.name, id = %handle.id, "Listener removed");
    }

    // -- Private helpers ------------------------------------------------

    fn register_with_engine(
        &self,
        name: &str,
        adapter: Arc<ListenerAdapter>,
    ) -> Result<(), EngineError> {
        let engine = &self.inner.engine;
        match self.inner.domain {
            NotificationDomain::SyncProgress => engine.add_sync_progress_listener(adapter, name),
            NotificationDomain::TxAndBlock => engine.add_tx_and_block_listener(adapter, name),
            NotificationDomain::AccountMixer => engine.add_account_mixer_listener(adapter, name),
            NotificationDomain::Proposal => engine.add_proposal_listener(adapter, name),
            NotificationDomain::Order => engine.add_order_listener(adapter, name),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CompactString, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
