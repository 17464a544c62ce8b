//! Redraw request coalescing.
//!
//! Consumer loops run on background tasks but the UI renders on its own
//! loop. A [`RedrawHandle`] carries "state changed, render again" across
//! that boundary: requests never block, and any number of requests made
//! before the next frame collapse into one pending redraw.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct RedrawHandle {
    inner: Arc<RedrawInner>,
}

#[derive(Default)]
struct RedrawInner {
    pending: AtomicBool,
    notify: Notify,
    requests: AtomicU64,
}

impl RedrawHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw at the next opportunity.
    pub fn request(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        if !self.inner.pending.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_one();
        }
    }

    /// Consume the pending redraw, if any. For frame-driven render loops.
    pub fn take_pending(&self) -> bool {
        self.inner.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Wait until a redraw is pending, then consume it.
    ///
    /// Meant for a single render loop; concurrent waiters would split the
    /// wake-ups between them.
    pub async fn wait(&self) {
        loop {
            if self.take_pending() {
                return;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Total number of requests made, coalesced or not.
    pub fn requests(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }
}
