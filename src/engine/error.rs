//! Engine error types.

use thiserror::Error;

/// Errors raised by the transition table and the processing lane.
///
/// Both variants describe programming mistakes. The panicking entry points
/// (`StateMachine::add_transition`, `StateMachine::process`) turn them into
/// panics; the `try_` variants hand them back to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("Transition with event '{event}' and source '{from}' already exists")]
    DuplicateTransition { event: String, from: String },

    #[error("Processing lane has shut down; no further events can be processed")]
    LaneClosed,
}
