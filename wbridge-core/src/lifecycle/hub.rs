use super::context::PageContext;
use crate::config::ChannelCapacities;
use crate::consumers::{ConsumerLoop, NotificationHandler};
use crate::events::NotificationDomain;
use crate::listeners::{AddOutcome, ListenerRegistry, RegistrationHandle, RegistryError};
use crate::redraw::RedrawHandle;
use std::sync::Arc;
use tracing::debug;
use wbridge_sdk::NotificationEngine;

/// Result of [`NotificationHub::attach`].
#[derive(Debug)]
pub enum Attachment {
    /// A registration was made and its consumer loop spawned.
    Started,
    /// The page already consumes this domain; nothing changed.
    Existing(RegistrationHandle),
}

struct HubInner {
    sync_progress: ListenerRegistry,
    tx_and_block: ListenerRegistry,
    account_mixer: ListenerRegistry,
    proposal: ListenerRegistry,
    order: ListenerRegistry,
    capacities: ChannelCapacities,
    redraw: RedrawHandle,
}

/// One listener registry per domain plus the shared redraw handle.
///
/// Cheap to clone; every page gets the same hub.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new(
        engine: Arc<dyn NotificationEngine>,
        capacities: ChannelCapacities,
        redraw: RedrawHandle,
    ) -> Self {
        let registry = |domain| ListenerRegistry::new(domain, Arc::clone(&engine));
        Self {
            inner: Arc::new(HubInner {
                sync_progress: registry(NotificationDomain::SyncProgress),
                tx_and_block: registry(NotificationDomain::TxAndBlock),
                account_mixer: registry(NotificationDomain::AccountMixer),
                proposal: registry(NotificationDomain::Proposal),
                order: registry(NotificationDomain::Order),
                capacities,
                redraw,
            }),
        }
    }

    pub fn registry(&self, domain: NotificationDomain) -> &ListenerRegistry {
        match domain {
            NotificationDomain::SyncProgress => &self.inner.sync_progress,
            NotificationDomain::TxAndBlock => &self.inner.tx_and_block,
            NotificationDomain::AccountMixer => &self.inner.account_mixer,
            NotificationDomain::Proposal => &self.inner.proposal,
            NotificationDomain::Order => &self.inner.order,
        }
    }

    pub fn redraw(&self) -> &RedrawHandle {
        &self.inner.redraw
    }

    pub fn capacities(&self) -> &ChannelCapacities {
        &self.inner.capacities
    }

    /// Register `ctx`'s page for `domain` and spawn a consumer loop feeding
    /// `handler` until the context is detached.
    ///
    /// Attaching a domain the page already consumes leaves the running loop
    /// alone and drops `handler`.
    pub async fn attach<H: NotificationHandler>(
        &self,
        ctx: &mut PageContext,
        domain: NotificationDomain,
        handler: H,
    ) -> Result<Attachment, RegistryError> {
        let capacity = self.inner.capacities.for_domain(domain);
        match self.registry(domain).add(ctx.name(), capacity).await? {
            AddOutcome::Registered(subscription) => {
                let consumer =
                    ConsumerLoop::new(subscription, handler, self.inner.redraw.clone());
                let handle = tokio::spawn(consumer.run(ctx.cancellation()));
                ctx.track(domain, handle);
                Ok(Attachment::Started)
            }
            AddOutcome::AlreadyRegistered(handle) => {
                debug!(%domain, page = ctx.name(), "Page already attached");
                Ok(Attachment::Existing(handle))
            }
        }
    }
}
