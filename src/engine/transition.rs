//! Transition records and processing outcomes.

use crate::core::{Event, Rule, State};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome delivered to a completion callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionResult {
    /// The transition committed
    Success,
    /// No transition matched, or a required rule failed
    Failure,
}

impl TransitionResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Callback receiving the outcome of one `process` call.
pub type Completion = Box<dyn FnOnce(TransitionResult) + Send + 'static>;

/// Immutable `(event, source) -> destination` record, optionally guarded by rules.
///
/// # Example
///
/// ```rust
/// use statelane::core::FnRule;
/// use statelane::engine::Transition;
/// use statelane::{event_enum, state_enum};
///
/// state_enum! {
///     enum Player { Idle, Playing }
/// }
///
/// event_enum! {
///     enum Control { Play }
/// }
///
/// let transition = Transition::new(Control::Play, Player::Idle, Player::Playing)
///     .rule(FnRule::required(|| true));
///
/// assert!(transition.matches_source(&Player::Idle));
/// assert_eq!(transition.rules().map(|rules| rules.len()), Some(1));
/// ```
#[derive(Clone)]
pub struct Transition<S: State, E: Event> {
    pub event: E,
    pub source: S,
    pub destination: S,
    rules: Option<Vec<Arc<dyn Rule>>>,
}

impl<S: State, E: Event> Transition<S, E> {
    /// Create an unguarded transition.
    pub fn new(event: E, source: S, destination: S) -> Self {
        Self {
            event,
            source,
            destination,
            rules: None,
        }
    }

    /// Replace the rule list.
    pub fn with_rules(mut self, rules: Vec<Arc<dyn Rule>>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Append a rule.
    pub fn rule<R: Rule + 'static>(self, rule: R) -> Self {
        self.shared_rule(Arc::new(rule))
    }

    /// Append a rule that is shared with other transitions.
    pub fn shared_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.get_or_insert_with(Vec::new).push(rule);
        self
    }

    /// Rules in registration order, or `None` when the transition is unguarded.
    pub fn rules(&self) -> Option<&[Arc<dyn Rule>]> {
        self.rules.as_deref()
    }

    /// Check whether this transition applies to `state`.
    pub fn matches_source(&self, state: &S) -> bool {
        self.source == *state
    }
}

impl<S: State, E: Event> fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("event", &self.event)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("rules", &self.rules.as_ref().map(Vec::len))
            .finish()
    }
}
