//! Public state machine facade.

use super::effect::TransitionEffect;
use super::error::MachineError;
use super::processor::{LaneSender, Processor, Submission};
use super::table::TransitionTable;
use super::transition::{Completion, Transition, TransitionResult};
use super::{lock_recover, read_recover};
use crate::builder::{BuildError, StateMachineBuilder};
use crate::checkpoint::Checkpoint;
use crate::config::MachineConfig;
use crate::core::{Event, State, StateHistory};
use crate::delivery::Dispatcher;
use crate::storage::{StateStorage, StorageError};
use std::io;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything needed to start a machine; assembled by the builder.
pub(crate) struct MachineParts<S: State, E: Event> {
    pub initial: S,
    pub history: StateHistory<S>,
    pub config: MachineConfig,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub storage: Arc<dyn StateStorage>,
    pub effect: Option<Arc<dyn TransitionEffect<S, E>>>,
}

/// Thread-safe state machine with serialized event processing.
///
/// Events submitted with [`process`](Self::process) are handled one at a
/// time, in submission order, on the machine's processing lane. Outcomes
/// arrive on the configured delivery context.
///
/// # Example
///
/// ```rust
/// use statelane::delivery::Inline;
/// use statelane::engine::{StateMachine, Transition};
/// use statelane::{event_enum, state_enum};
///
/// state_enum! {
///     enum Light { Off, On }
/// }
///
/// event_enum! {
///     enum Switch { Flip }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let machine: StateMachine<Light, Switch> = StateMachine::builder()
///     .initial(Light::Off)
///     .dispatcher(Inline)
///     .build()
///     .unwrap();
///
/// machine.add_transition(Transition::new(Switch::Flip, Light::Off, Light::On));
///
/// let result = machine.process_async(Switch::Flip).await;
/// assert!(result.is_success());
/// assert_eq!(machine.current_state(), Light::On);
/// # }
/// ```
pub struct StateMachine<S: State, E: Event> {
    id: Uuid,
    config: MachineConfig,
    table: Mutex<TransitionTable<S, E>>,
    current: Arc<RwLock<S>>,
    history: Arc<Mutex<StateHistory<S>>>,
    storage: Arc<dyn StateStorage>,
    lane: LaneSender<S, E>,
}

impl<S: State, E: Event> StateMachine<S, E> {
    /// Start a machine in `initial` with default configuration.
    pub fn new(initial: S) -> Result<Self, BuildError> {
        StateMachineBuilder::new().initial(initial).build()
    }

    pub fn builder() -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new()
    }

    pub(crate) fn start(parts: MachineParts<S, E>) -> io::Result<Self> {
        let id = Uuid::new_v4();
        let current = Arc::new(RwLock::new(parts.initial));
        let history = Arc::new(Mutex::new(parts.history));

        let lane = Processor::new(
            id,
            Arc::clone(&current),
            Arc::clone(&history),
            parts.dispatcher,
            parts.effect,
            parts.config.clone(),
        )
        .spawn()?;

        info!(machine = %id, lane = %parts.config.lane_name, "state machine started");

        Ok(Self {
            id,
            config: parts.config,
            table: Mutex::new(TransitionTable::new()),
            current,
            history,
            storage: parts.storage,
            lane,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Last committed state.
    pub fn current_state(&self) -> S {
        read_recover(&self.current).clone()
    }

    pub fn is_final(&self) -> bool {
        read_recover(&self.current).is_final()
    }

    /// Register a transition.
    ///
    /// # Panics
    ///
    /// Panics if a transition for the same event and source already exists.
    pub fn add_transition(&self, transition: Transition<S, E>) {
        if let Err(err) = self.try_add_transition(transition) {
            panic!("{err}");
        }
    }

    /// Register a transition, reporting a duplicate instead of panicking.
    pub fn try_add_transition(&self, transition: Transition<S, E>) -> Result<(), MachineError> {
        if self.config.log_transitions {
            debug!(
                machine = %self.id,
                event = transition.event.name(),
                from = transition.source.name(),
                to = transition.destination.name(),
                "registering transition"
            );
        }
        lock_recover(&self.table).try_register(transition)
    }

    /// Transitions currently registered for `event`.
    pub fn transitions_for(&self, event: &E) -> Vec<Transition<S, E>> {
        lock_recover(&self.table).lookup(event)
    }

    /// Submit an event without waiting for it to be processed.
    ///
    /// `completion` runs exactly once on the delivery context.
    ///
    /// # Panics
    ///
    /// Panics if the processing lane has died, which only happens after a
    /// fatal configuration error on a previous event.
    pub fn process(&self, event: E, completion: Option<Completion>) {
        if let Err(err) = self.try_process(event, completion) {
            panic!("{err}");
        }
    }

    /// Submit an event, reporting a dead processing lane instead of panicking.
    pub fn try_process(&self, event: E, completion: Option<Completion>) -> Result<(), MachineError> {
        let candidates = lock_recover(&self.table).lookup(&event);
        self.lane
            .send(Submission {
                event,
                candidates,
                completion,
            })
            .map_err(|_| MachineError::LaneClosed)
    }

    /// Submit an event and wait for its outcome.
    ///
    /// Must not be awaited from a callback running on a `SerialQueue`
    /// belonging to this machine: the outcome is delivered on that queue.
    pub async fn process_async(&self, event: E) -> TransitionResult {
        let (sender, receiver) = oneshot::channel();
        self.process(
            event,
            Some(Box::new(move |result| {
                let _ = sender.send(result);
            })),
        );
        receiver.await.unwrap_or(TransitionResult::Failure)
    }

    /// Read the persisted state. Does not affect the current state.
    pub fn restored_state(&self) -> Option<S> {
        let value = match self.storage.load() {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(err) => {
                warn!(machine = %self.id, error = %err, "failed to load stored state");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(machine = %self.id, error = %err, "stored state is not a valid state");
                None
            }
        }
    }

    /// Persist the current committed state.
    pub fn store_current_state(&self) -> Result<(), StorageError> {
        let value = serde_json::to_value(self.current_state())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.save(Some(value))
    }

    /// Remove any persisted state.
    pub fn clear_state_storage(&self) -> Result<(), StorageError> {
        self.storage.save(None)
    }

    /// Committed transitions recorded so far.
    pub fn history(&self) -> StateHistory<S> {
        lock_recover(&self.history).clone()
    }

    /// Consistent snapshot of the current state and history.
    pub fn checkpoint(&self) -> Checkpoint<S> {
        let history = lock_recover(&self.history);
        let current = read_recover(&self.current).clone();
        Checkpoint::new(self.id, current, history.clone())
    }
}

impl<S: State, E: Event> std::fmt::Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("current", &self.current_state())
            .field("transitions", &lock_recover(&self.table).len())
            .finish_non_exhaustive()
    }
}
