//! Dedicated-thread FIFO dispatcher.

use super::{run_guarded, Dispatcher, Job};
use std::io;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Serial callback queue backed by one named thread.
///
/// Jobs run one at a time in dispatch order. The thread exits once every
/// handle to the queue has been dropped and the backlog is drained.
#[derive(Clone)]
pub struct SerialQueue {
    name: String,
    sender: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
    /// Spawn the queue's thread.
    pub fn new(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let thread_name = name.clone();
        thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                run_guarded(job);
            }
            debug!(queue = %thread_name, "serial queue drained, exiting");
        })?;

        Ok(Self { name, sender })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Dispatcher for SerialQueue {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!(queue = %self.name, "serial queue closed, dropping job");
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
