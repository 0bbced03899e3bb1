//! Serialized event processing lane.
//!
//! One thread drains a FIFO channel of submissions. Each submission runs
//! resolve, rule check and commit to completion before the next one is
//! received, so at most one event is ever between resolving and committing.
//! Callbacks are handed to the dispatcher in a fixed order: rule failure
//! callbacks, then the transition effect (on commit), then the completion.

use super::effect::TransitionEffect;
use super::evaluator::evaluate;
use super::transition::{Completion, Transition, TransitionResult};
use super::{lock_recover, read_recover, write_recover};
use crate::config::MachineConfig;
use crate::core::{Event, Rule, State, StateHistory, StateTransition};
use crate::delivery::Dispatcher;
use chrono::Utc;
use std::io;
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An event admitted to the lane, with the candidates snapshotted at submission.
pub(crate) struct Submission<S: State, E: Event> {
    pub event: E,
    pub candidates: Vec<Transition<S, E>>,
    pub completion: Option<Completion>,
}

pub(crate) type LaneSender<S, E> = mpsc::UnboundedSender<Submission<S, E>>;

pub(crate) struct Processor<S: State, E: Event> {
    machine_id: Uuid,
    current: Arc<RwLock<S>>,
    history: Arc<Mutex<StateHistory<S>>>,
    dispatcher: Arc<dyn Dispatcher>,
    effect: Option<Arc<dyn TransitionEffect<S, E>>>,
    config: MachineConfig,
    committed: u64,
}

impl<S: State, E: Event> Processor<S, E> {
    pub fn new(
        machine_id: Uuid,
        current: Arc<RwLock<S>>,
        history: Arc<Mutex<StateHistory<S>>>,
        dispatcher: Arc<dyn Dispatcher>,
        effect: Option<Arc<dyn TransitionEffect<S, E>>>,
        config: MachineConfig,
    ) -> Self {
        let committed = lock_recover(&history)
            .last()
            .map(|transition| transition.sequence)
            .unwrap_or(0);

        Self {
            machine_id,
            current,
            history,
            dispatcher,
            effect,
            config,
            committed,
        }
    }

    /// Move the processor onto its own thread and return the lane's sender.
    ///
    /// The thread exits once every sender is dropped and the backlog is drained.
    pub fn spawn(mut self) -> io::Result<LaneSender<S, E>> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Submission<S, E>>();

        thread::Builder::new()
            .name(self.config.lane_name.clone())
            .spawn(move || {
                while let Some(submission) = receiver.blocking_recv() {
                    self.handle(submission);
                }
                debug!(machine = %self.machine_id, "processing lane drained, exiting");
            })?;

        Ok(sender)
    }

    pub fn handle(&mut self, submission: Submission<S, E>) {
        let Submission {
            event,
            candidates,
            completion,
        } = submission;
        let observed = read_recover(&self.current).clone();

        let Some(transition) = resolve(&candidates, &observed) else {
            if self.config.log_transitions {
                debug!(
                    machine = %self.machine_id,
                    event = event.name(),
                    state = observed.name(),
                    "no transition registered for event in current state"
                );
            }
            self.notify(TransitionResult::Failure, Vec::new(), None, completion);
            return;
        };

        if self.config.log_transitions && transition.rules().is_some() {
            debug!(
                machine = %self.machine_id,
                event = event.name(),
                "processing rules for transition"
            );
        }

        let evaluation = evaluate(transition.rules());
        if !evaluation.is_allowed() {
            if self.config.log_transitions {
                info!(
                    machine = %self.machine_id,
                    event = event.name(),
                    state = observed.name(),
                    violations = ?evaluation.violations(),
                    "required rules failed, transition rejected"
                );
            }
            self.notify(
                TransitionResult::Failure,
                evaluation.into_failing_rules(),
                None,
                completion,
            );
            return;
        }

        let destination = transition.destination.clone();
        self.commit(&observed, &destination, &event);
        self.notify(
            TransitionResult::Success,
            evaluation.into_failing_rules(),
            Some((destination, event)),
            completion,
        );
    }

    fn commit(&mut self, from: &S, to: &S, event: &E) {
        // History is locked across the write so snapshots see both or neither.
        let mut history = lock_recover(&self.history);
        *write_recover(&self.current) = to.clone();
        self.committed += 1;

        if self.config.record_history {
            history.push_bounded(
                StateTransition {
                    from: from.clone(),
                    to: to.clone(),
                    event: event.name().to_string(),
                    timestamp: Utc::now(),
                    sequence: self.committed,
                },
                self.config.history_limit,
            );
        }

        if self.config.log_transitions {
            info!(
                machine = %self.machine_id,
                event = event.name(),
                from = from.name(),
                to = to.name(),
                sequence = self.committed,
                "processed state change"
            );
        }
    }

    fn notify(
        &self,
        result: TransitionResult,
        failing: Vec<Arc<dyn Rule>>,
        committed: Option<(S, E)>,
        completion: Option<Completion>,
    ) {
        for rule in failing {
            self.dispatcher.dispatch(Box::new(move || rule.on_failure()));
        }

        if let (Some((state, event)), Some(effect)) = (committed, &self.effect) {
            let effect = Arc::clone(effect);
            let machine_id = self.machine_id;
            self.dispatcher.dispatch(Box::new(move || {
                if let Err(err) = effect.on_transition(&state, &event) {
                    warn!(
                        machine = %machine_id,
                        event = event.name(),
                        state = state.name(),
                        error = %err,
                        "transition effect failed"
                    );
                }
            }));
        }

        if let Some(completion) = completion {
            self.dispatcher.dispatch(Box::new(move || completion(result)));
        }
    }
}

/// Pick the candidate whose source is `observed`.
///
/// # Panics
///
/// Panics when more than one candidate matches; the table never admits that.
pub(crate) fn resolve<'a, S: State, E: Event>(
    candidates: &'a [Transition<S, E>],
    observed: &S,
) -> Option<&'a Transition<S, E>> {
    let mut matching = candidates.iter().filter(|t| t.matches_source(observed));
    let first = matching.next()?;

    let extra = matching.count();
    if extra > 0 {
        panic!(
            "Found {} transitions with event '{:?}' and source '{:?}'",
            extra + 1,
            first.event,
            observed
        );
    }

    Some(first)
}
