//! Transition table keyed by event.

use super::error::MachineError;
use super::transition::Transition;
use crate::core::{Event, State};
use std::collections::HashMap;

/// Candidate transitions grouped by event.
///
/// Holds at most one transition per `(event, source)` pair.
pub struct TransitionTable<S: State, E: Event> {
    by_event: HashMap<E, Vec<Transition<S, E>>>,
}

impl<S: State, E: Event> TransitionTable<S, E> {
    pub fn new() -> Self {
        Self {
            by_event: HashMap::new(),
        }
    }

    /// Register a transition, rejecting a second one for the same `(event, source)`.
    pub fn try_register(&mut self, transition: Transition<S, E>) -> Result<(), MachineError> {
        let candidates = self.by_event.entry(transition.event.clone()).or_default();

        if candidates
            .iter()
            .any(|existing| existing.source == transition.source)
        {
            return Err(MachineError::DuplicateTransition {
                event: format!("{:?}", transition.event),
                from: format!("{:?}", transition.source),
            });
        }

        candidates.push(transition);
        Ok(())
    }

    /// Register a transition.
    ///
    /// # Panics
    ///
    /// Panics if a transition for the same `(event, source)` is already registered.
    pub fn register(&mut self, transition: Transition<S, E>) {
        if let Err(err) = self.try_register(transition) {
            panic!("{err}");
        }
    }

    /// All transitions registered for `event`, regardless of source.
    pub fn lookup(&self, event: &E) -> Vec<Transition<S, E>> {
        self.by_event.get(event).cloned().unwrap_or_default()
    }

    /// Total number of registered transitions.
    pub fn len(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: State, E: Event> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
