use crate::events::NotificationDomain;
use compact_str::CompactString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Cancellation scope for one visibility period of a page.
///
/// Every consumer loop attached through this context watches its
/// cancellation signal. [`detach`](PageContext::detach) consumes the
/// context, so a page cannot detach the same period twice. Dropping the
/// context without detaching also stops the loops, but does not wait for
/// them.
pub struct PageContext {
    name: CompactString,
    cancel_tx: watch::Sender<bool>,
    loops: Vec<(NotificationDomain, JoinHandle<()>)>,
}

impl PageContext {
    pub fn new(name: &str) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            name: CompactString::from(name),
            cancel_tx,
            loops: Vec::new(),
        }
    }

    /// The consumer name used for every registration of this page.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Number of consumer loops that have not exited yet.
    pub fn running_loops(&self) -> usize {
        self.loops
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }

    pub(super) fn track(&mut self, domain: NotificationDomain, handle: JoinHandle<()>) {
        self.loops.push((domain, handle));
    }

    /// Signal cancellation without waiting.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Cancel every consumer loop and wait until each has torn down its
    /// registration.
    pub async fn detach(self) {
        self.cancel();
        let loops = self.loops.len();
        for (domain, handle) in self.loops {
            if let Err(e) = handle.await {
                error!(page = %self.name, %domain, error = %e, "Consumer loop failed");
            }
        }
        info!(page = %self.name, loops, "Page detached");
    }
}
