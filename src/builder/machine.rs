//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::checkpoint::Checkpoint;
use crate::config::MachineConfig;
use crate::core::{Event, State, StateHistory};
use crate::delivery::{Dispatcher, SerialQueue};
use crate::engine::{MachineParts, StateMachine, Transition, TransitionEffect};
use crate::storage::{MemoryStorage, StateStorage};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// Only the initial state is required. Without further configuration the
/// machine delivers callbacks on its own `SerialQueue`, keeps state storage
/// in memory and runs no transition effect.
pub struct StateMachineBuilder<S: State, E: Event> {
    initial: Option<S>,
    history: StateHistory<S>,
    config: MachineConfig,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    storage: Option<Arc<dyn StateStorage>>,
    effect: Option<Arc<dyn TransitionEffect<S, E>>>,
    transitions: Vec<Transition<S, E>>,
}

impl<S: State, E: Event> StateMachineBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            history: StateHistory::new(),
            config: MachineConfig::default(),
            dispatcher: None,
            storage: None,
            effect: None,
            transitions: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Continue from a checkpoint: its state becomes the initial state and
    /// its history is carried over.
    /// Returns an error if the checkpoint fails validation.
    pub fn resume(mut self, checkpoint: Checkpoint<S>) -> Result<Self, BuildError> {
        checkpoint.validate()?;
        self.initial = Some(checkpoint.current_state);
        self.history = checkpoint.history;
        Ok(self)
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the delivery context for callbacks.
    pub fn dispatcher<D: Dispatcher + 'static>(self, dispatcher: D) -> Self {
        self.shared_dispatcher(Arc::new(dispatcher))
    }

    pub fn shared_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Set the persistence collaborator.
    pub fn storage<T: StateStorage + 'static>(mut self, storage: T) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Set the post-commit effect.
    pub fn effect<F: TransitionEffect<S, E> + 'static>(mut self, effect: F) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder<S, E>) -> Result<Self, BuildError> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: Vec<Transition<S, E>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Build and start the state machine.
    ///
    /// Duplicate `(event, source)` registrations are reported as
    /// `BuildError::InvalidTable`.
    pub fn build(self) -> Result<StateMachine<S, E>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let dispatcher: Arc<dyn Dispatcher> = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Arc::new(SerialQueue::new(self.config.callback_queue_name())?),
        };
        let storage: Arc<dyn StateStorage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };

        let machine = StateMachine::start(MachineParts {
            initial,
            history: self.history,
            config: self.config,
            dispatcher,
            storage,
            effect: self.effect,
        })?;

        for transition in self.transitions {
            machine.try_add_transition(transition)?;
        }

        Ok(machine)
    }
}

impl<S: State, E: Event> Default for StateMachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointError;
    use crate::core::StateTransition;
    use crate::delivery::Inline;
    use crate::engine::MachineError;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Running,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Running => "Running",
            }
        }
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Start,
        Stop,
    }

    impl Event for TestEvent {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Stop => "Stop",
            }
        }
    }

    #[test]
    fn builder_requires_initial_state() {
        let result = StateMachineBuilder::<TestState, TestEvent>::new().build();
        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_without_transitions_is_valid() {
        let machine = StateMachineBuilder::<TestState, TestEvent>::new()
            .initial(TestState::Idle)
            .build()
            .unwrap();
        assert_eq!(machine.current_state(), TestState::Idle);
    }

    #[test]
    fn fluent_api_registers_transitions() {
        let machine = StateMachineBuilder::new()
            .initial(TestState::Idle)
            .dispatcher(Inline)
            .transition(
                TransitionBuilder::new()
                    .on(TestEvent::Start)
                    .from(TestState::Idle)
                    .to(TestState::Running),
            )
            .unwrap()
            .add_transition(Transition::new(
                TestEvent::Stop,
                TestState::Running,
                TestState::Idle,
            ))
            .build()
            .unwrap();

        assert_eq!(machine.transitions_for(&TestEvent::Start).len(), 1);
        assert_eq!(machine.transitions_for(&TestEvent::Stop).len(), 1);
    }

    #[test]
    fn duplicate_transitions_fail_the_build() {
        let result = StateMachineBuilder::new()
            .initial(TestState::Idle)
            .transitions(vec![
                Transition::new(TestEvent::Start, TestState::Idle, TestState::Running),
                Transition::new(TestEvent::Start, TestState::Idle, TestState::Idle),
            ])
            .build();

        assert!(matches!(
            result,
            Err(BuildError::InvalidTable(MachineError::DuplicateTransition { .. }))
        ));
    }

    #[test]
    fn transition_builder_errors_propagate() {
        let result = StateMachineBuilder::<TestState, TestEvent>::new()
            .initial(TestState::Idle)
            .transition(TransitionBuilder::new().from(TestState::Idle));

        assert!(matches!(result, Err(BuildError::MissingEvent)));
    }

    fn started_history() -> StateHistory<TestState> {
        StateHistory::new().record(StateTransition {
            from: TestState::Idle,
            to: TestState::Running,
            event: "Start".to_string(),
            timestamp: Utc::now(),
            sequence: 1,
        })
    }

    #[test]
    fn resume_carries_state_and_history() {
        let checkpoint = Checkpoint::new(Uuid::new_v4(), TestState::Running, started_history());

        let machine = StateMachineBuilder::<TestState, TestEvent>::new()
            .resume(checkpoint)
            .unwrap()
            .dispatcher(Inline)
            .build()
            .unwrap();

        assert_eq!(machine.current_state(), TestState::Running);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn resume_rejects_inconsistent_checkpoint() {
        let checkpoint = Checkpoint::new(Uuid::new_v4(), TestState::Idle, started_history());

        let result = StateMachineBuilder::<TestState, TestEvent>::new().resume(checkpoint);

        assert!(matches!(
            result,
            Err(BuildError::InvalidCheckpoint(CheckpointError::InconsistentHistory { .. }))
        ));
    }

    #[test]
    fn config_is_applied() {
        let machine = StateMachineBuilder::<TestState, TestEvent>::new()
            .initial(TestState::Idle)
            .config(MachineConfig {
                lane_name: "builder-test".to_string(),
                ..MachineConfig::default()
            })
            .build()
            .unwrap();

        assert_eq!(machine.config().lane_name, "builder-test");
    }
}
