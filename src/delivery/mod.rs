//! Delivery contexts for completion and rule-failure callbacks.
//!
//! A `Dispatcher` accepts units of work and runs them somewhere other than
//! the caller, or inline. The processing lane never mutates state from a
//! dispatched job; jobs only carry values.
//!
//! - `SerialQueue`: dedicated thread, FIFO (the default)
//! - `Inline`: runs on the calling thread
//! - `TokioDispatcher`: FIFO delivery onto a tokio runtime

mod runtime;
mod serial;

pub use runtime::TokioDispatcher;
pub use serial::SerialQueue;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// A unit of work handed to a dispatcher.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context used for every callback the machine delivers.
///
/// Implementations must run jobs in the order they were dispatched.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs jobs immediately on the dispatching thread.
///
/// Used with a machine this runs callbacks on the processing lane, so a
/// slow callback delays the next event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inline;

impl Dispatcher for Inline {
    fn dispatch(&self, job: Job) {
        run_guarded(job);
    }
}

/// Run a job, containing any panic it raises so the hosting lane survives.
pub(crate) fn run_guarded(job: Job) {
    if let Err(panic_info) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let panic_msg = extract_panic_message(&panic_info);
        error!(panic = %panic_msg, "delivered callback panicked");
    }
}

pub(crate) fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
