//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders and macros for creating state machines
//! with minimal boilerplate while maintaining type safety.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{Event, Rule, State};
use crate::engine::Transition;
use std::sync::Arc;

/// Create an unguarded transition.
///
/// # Example
///
/// ```
/// use statelane::builder::simple_transition;
/// use statelane::{event_enum, state_enum};
///
/// state_enum! {
///     enum MyState {
///         Start,
///         End,
///     }
///     final: [End]
/// }
///
/// event_enum! {
///     enum MyEvent { Finish }
/// }
///
/// let transition = simple_transition(MyEvent::Finish, MyState::Start, MyState::End);
/// assert!(transition.rules().is_none());
/// ```
pub fn simple_transition<S: State, E: Event>(event: E, from: S, to: S) -> Transition<S, E> {
    Transition::new(event, from, to)
}

/// Create a transition guarded by the given rules, evaluated in order.
///
/// # Example
///
/// ```
/// use statelane::builder::guarded_transition;
/// use statelane::core::{FnRule, Rule};
/// use statelane::{event_enum, state_enum};
/// use std::sync::Arc;
///
/// state_enum! {
///     enum MyState {
///         Start,
///         Middle,
///     }
/// }
///
/// event_enum! {
///     enum MyEvent { Advance }
/// }
///
/// let rules: Vec<Arc<dyn Rule>> = vec![Arc::new(FnRule::required(|| true))];
/// let transition = guarded_transition(MyEvent::Advance, MyState::Start, MyState::Middle, rules);
/// assert_eq!(transition.rules().map(|rules| rules.len()), Some(1));
/// ```
pub fn guarded_transition<S: State, E: Event>(
    event: E,
    from: S,
    to: S,
    rules: Vec<Arc<dyn Rule>>,
) -> Transition<S, E> {
    Transition::new(event, from, to).with_rules(rules)
}
