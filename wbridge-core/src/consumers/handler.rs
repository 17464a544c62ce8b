use crate::events::{Notification, NotificationDomain};
use async_trait::async_trait;
use thiserror::Error;
use wbridge_sdk::EngineError;

/// Errors a handler can report. The consumer loop logs them and moves on.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Refetching state from the engine failed
    #[error("engine query failed: {0}")]
    Engine(#[from] EngineError),

    /// The handler received a notification from a domain it does not serve
    #[error("unexpected {0} notification")]
    Unexpected(NotificationDomain),
}

/// Whether the page needs to be rendered again after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Requested,
    Skip,
}

/// Page-specific handling of one notification domain.
#[async_trait]
pub trait NotificationHandler: Send + 'static {
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError>;
}

/// Handler backed by a closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

/// Wrap a closure as a [`NotificationHandler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(Notification) -> Redraw + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F> NotificationHandler for FnHandler<F>
where
    F: FnMut(Notification) -> Redraw + Send + 'static,
{
    async fn handle(&mut self, notification: Notification) -> Result<Redraw, HandlerError> {
        Ok((self.0)(notification))
    }
}
