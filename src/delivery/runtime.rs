//! Ordered delivery onto a tokio runtime.

use super::{run_guarded, Dispatcher, Job};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::warn;

/// Dispatcher that runs jobs on a tokio runtime, one at a time, in order.
///
/// A single task drains the queue, so callbacks never interleave.
#[derive(Clone, Debug)]
pub struct TokioDispatcher {
    sender: mpsc::UnboundedSender<Job>,
}

impl TokioDispatcher {
    /// Spawn the draining task on `handle`.
    pub fn new(handle: &Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        handle.spawn(async move {
            while let Some(job) = receiver.recv().await {
                run_guarded(job);
            }
        });
        Self { sender }
    }

    /// Spawn on the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(&Handle::current())
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("tokio delivery task stopped, dropping job");
        }
    }
}
