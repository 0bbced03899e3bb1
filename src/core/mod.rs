//! Core value types of the engine.
//!
//! - States and events via the `State` and `Event` traits
//! - Rules guarding transitions
//! - Immutable history of committed transitions
//!
//! Nothing in this module touches threads or shared state.

mod history;
mod rule;
mod state;

pub use history::{StateHistory, StateTransition};
pub use rule::{FailureCallback, FnRule, Rule};
pub use state::{Event, State};
