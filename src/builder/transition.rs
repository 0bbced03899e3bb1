//! Builder for constructing state transitions.

use crate::builder::error::BuildError;
use crate::core::{Event, FnRule, Rule, State};
use crate::engine::Transition;
use std::sync::Arc;

/// Builder for constructing transitions with a fluent API.
pub struct TransitionBuilder<S: State, E: Event> {
    event: Option<E>,
    from: Option<S>,
    to: Option<S>,
    rules: Option<Vec<Arc<dyn Rule>>>,
}

impl<S: State, E: Event> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            event: None,
            from: None,
            to: None,
            rules: None,
        }
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: E) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Add a rule (optional).
    pub fn rule<R: Rule + 'static>(self, rule: R) -> Self {
        self.shared_rule(Arc::new(rule))
    }

    /// Add a rule shared with other transitions (optional).
    pub fn shared_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.get_or_insert_with(Vec::new).push(rule);
        self
    }

    /// Add a required rule from a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.rule(FnRule::required(predicate))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E>, BuildError> {
        let event = self.event.ok_or(BuildError::MissingEvent)?;
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;

        let transition = Transition::new(event, from, to);
        Ok(match self.rules {
            Some(rules) => transition.with_rules(rules),
            None => transition,
        })
    }
}

impl<S: State, E: Event> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
