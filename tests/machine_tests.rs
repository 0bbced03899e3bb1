//! End-to-end behaviour of `StateMachine` across its three lanes.

use serde::{Deserialize, Serialize};
use statelane::core::{Event, FnRule, State};
use statelane::delivery::{Inline, TokioDispatcher};
use statelane::engine::{MachineError, StateMachine, Transition, TransitionResult};
use statelane::storage::{FileStorage, MemoryStorage, StateStorage};
use statelane::{event_enum, state_enum, Checkpoint, MachineConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

state_enum! {
    enum Player {
        Idle,
        Running,
        Stopped,
    }
    final: [Stopped]
}

event_enum! {
    enum Control {
        EventA,
        EventB,
        EventStop,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Submit `event` and block until its completion is delivered.
fn process_blocking<S: State, E: Event>(machine: &StateMachine<S, E>, event: E) -> TransitionResult {
    let (tx, rx) = mpsc::channel();
    machine.process(
        event,
        Some(Box::new(move |result| {
            let _ = tx.send(result);
        })),
    );
    rx.recv_timeout(Duration::from_secs(5))
        .expect("completion was not delivered")
}

fn player() -> StateMachine<Player, Control> {
    init_tracing();
    let machine = StateMachine::new(Player::Idle).unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));
    machine.add_transition(Transition::new(
        Control::EventStop,
        Player::Running,
        Player::Stopped,
    ));
    machine
}

fn counting(rule: FnRule, calls: &Arc<AtomicUsize>) -> FnRule {
    let counter = Arc::clone(calls);
    rule.with_failure_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn events_drive_registered_transitions() {
    let machine = player();

    assert_eq!(process_blocking(&machine, Control::EventA), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Running);
    assert!(!machine.is_final());

    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Stopped);
    assert!(machine.is_final());
}

#[test]
fn unmatched_event_is_rejected_without_side_effects() {
    let machine = player();

    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Failure);
    assert_eq!(process_blocking(&machine, Control::EventB), TransitionResult::Failure);
    assert_eq!(machine.current_state(), Player::Idle);
    assert!(machine.history().is_empty());
}

#[test]
fn stop_is_rejected_until_player_is_running() {
    init_tracing();
    let machine = StateMachine::new(Player::Idle).unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));
    machine.add_transition(Transition::new(
        Control::EventStop,
        Player::Running,
        Player::Idle,
    ));

    assert_eq!(machine.current_state(), Player::Idle);
    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Failure);
    assert_eq!(machine.current_state(), Player::Idle);

    assert_eq!(process_blocking(&machine, Control::EventA), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Running);

    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Idle);

    let history = machine.history();
    let path: Vec<Player> = history.get_path().into_iter().copied().collect();
    assert_eq!(path, vec![Player::Idle, Player::Running, Player::Idle]);
}

#[test]
fn failing_required_rule_blocks_and_reports_once() {
    let machine = player();
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);

    machine.add_transition(
        Transition::new(Control::EventB, Player::Idle, Player::Stopped).rule(
            FnRule::required(|| false).with_failure_callback(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ),
    );

    assert_eq!(process_blocking(&machine, Control::EventB), TransitionResult::Failure);
    assert_eq!(machine.current_state(), Player::Idle);
    // Failure callbacks are delivered before the completion on the same queue.
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[test]
fn failing_optional_rule_does_not_block() {
    let machine = player();
    let order = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&order);

    machine.add_transition(
        Transition::new(Control::EventB, Player::Idle, Player::Running)
            .rule(FnRule::required(|| true))
            .rule(FnRule::optional(|| false).with_failure_callback(move || {
                log.lock().unwrap().push("optional failed");
            })),
    );

    let (tx, rx) = mpsc::channel();
    let log = Arc::clone(&order);
    machine.process(
        Control::EventB,
        Some(Box::new(move |result| {
            log.lock().unwrap().push("completion");
            let _ = tx.send(result);
        })),
    );

    assert_eq!(rx.recv().unwrap(), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Running);
    assert_eq!(*order.lock().unwrap(), vec!["optional failed", "completion"]);
}

#[test]
fn several_failing_optional_rules_still_commit() {
    let machine = player();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    machine.add_transition(
        Transition::new(Control::EventB, Player::Idle, Player::Running)
            .rule(counting(FnRule::optional(|| false), &first))
            .rule(counting(FnRule::optional(|| false), &second)),
    );

    assert_eq!(process_blocking(&machine, Control::EventB), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Running);
    assert_eq!(machine.history().len(), 1);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn mixed_rules_block_on_required_and_report_every_failure() {
    let machine = player();
    let required = Arc::new(AtomicUsize::new(0));
    let optional_passing = Arc::new(AtomicUsize::new(0));
    let optional_failing = Arc::new(AtomicUsize::new(0));

    machine.add_transition(
        Transition::new(Control::EventB, Player::Idle, Player::Running)
            .rule(counting(FnRule::optional(|| true), &optional_passing))
            .rule(counting(FnRule::required(|| false), &required))
            .rule(counting(FnRule::optional(|| false), &optional_failing)),
    );

    assert_eq!(process_blocking(&machine, Control::EventB), TransitionResult::Failure);
    assert_eq!(machine.current_state(), Player::Idle);
    assert!(machine.history().is_empty());
    assert_eq!(required.load(Ordering::SeqCst), 1);
    assert_eq!(optional_failing.load(Ordering::SeqCst), 1);
    assert_eq!(optional_passing.load(Ordering::SeqCst), 0);
}

#[test]
fn rules_are_evaluated_once_per_attempt() {
    let machine = player();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    machine.add_transition(
        Transition::new(Control::EventB, Player::Idle, Player::Running).rule(FnRule::required(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
        )),
    );

    process_blocking(&machine, Control::EventB);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic(expected = "already exists")]
fn duplicate_registration_panics() {
    let machine = player();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Stopped,
    ));
}

#[test]
fn duplicate_registration_is_reported_by_try_variant() {
    let machine = player();
    let err = machine
        .try_add_transition(Transition::new(
            Control::EventA,
            Player::Idle,
            Player::Stopped,
        ))
        .unwrap_err();

    assert!(matches!(err, MachineError::DuplicateTransition { .. }));
    assert_eq!(machine.transitions_for(&Control::EventA).len(), 1);
}

#[test]
fn same_event_from_different_sources_is_allowed() {
    let machine = player();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Running,
        Player::Idle,
    ));

    assert_eq!(machine.transitions_for(&Control::EventA).len(), 2);
    process_blocking(&machine, Control::EventA);
    process_blocking(&machine, Control::EventA);
    assert_eq!(machine.current_state(), Player::Idle);
}

#[test]
fn callbacks_run_on_the_callback_queue() {
    init_tracing();
    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .config(MachineConfig {
            lane_name: "player".to_string(),
            ..MachineConfig::default()
        })
        .build()
        .unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));

    let (tx, rx) = mpsc::channel();
    machine.process(
        Control::EventA,
        Some(Box::new(move |_| {
            let _ = tx.send(thread::current().name().map(str::to_string));
        })),
    );

    assert_eq!(rx.recv().unwrap().as_deref(), Some("player-callbacks"));
}

#[test]
fn panicking_callback_does_not_stop_the_machine() {
    let machine = player();

    machine.process(
        Control::EventA,
        Some(Box::new(|_: TransitionResult| panic!("callback blew up"))),
    );
    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Success);
    assert_eq!(machine.current_state(), Player::Stopped);
}

#[test]
fn panicking_rule_rejects_and_lane_survives() {
    init_tracing();
    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .dispatcher(Inline)
        .add_transition(
            Transition::new(Control::EventA, Player::Idle, Player::Running)
                .rule(FnRule::required(|| panic!("rule blew up"))),
        )
        .add_transition(Transition::new(
            Control::EventB,
            Player::Idle,
            Player::Stopped,
        ))
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    for event in [Control::EventA, Control::EventB] {
        let tx = tx.clone();
        machine.process(
            event,
            Some(Box::new(move |result| {
                let _ = tx.send((event, result));
            })),
        );
    }

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(first, (Control::EventA, TransitionResult::Failure));
    assert_eq!(second, (Control::EventB, TransitionResult::Success));
    assert_eq!(machine.current_state(), Player::Stopped);
    assert!(machine.try_process(Control::EventA, None).is_ok());
}

#[test]
fn effect_runs_after_commit_and_before_completion() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .effect(move |state: &Player, event: &Control| -> anyhow::Result<()> {
            sink.lock().unwrap().push(format!("{}:{}", event.name(), state.name()));
            anyhow::ensure!(*state != Player::Stopped, "no screen for {}", state.name());
            Ok(())
        })
        .build()
        .unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));
    machine.add_transition(Transition::new(
        Control::EventStop,
        Player::Running,
        Player::Stopped,
    ));

    assert_eq!(process_blocking(&machine, Control::EventB), TransitionResult::Failure);
    assert_eq!(process_blocking(&machine, Control::EventA), TransitionResult::Success);
    // A failing effect is logged and does not change the outcome.
    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Success);

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["EventA:Running".to_string(), "EventStop:Stopped".to_string()]
    );
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
struct Counter(u32);

impl State for Counter {
    fn name(&self) -> &str {
        "Counter"
    }
}

event_enum! {
    enum Tick {
        Tick,
    }
}

#[test]
fn concurrent_submissions_are_serialized() {
    const THREADS: u32 = 8;
    const PER_THREAD: u32 = 50;
    const TOTAL: u32 = THREADS * PER_THREAD;

    init_tracing();
    let machine: StateMachine<Counter, Tick> = StateMachine::builder()
        .initial(Counter(0))
        .config(MachineConfig {
            log_transitions: false,
            ..MachineConfig::default()
        })
        .build()
        .unwrap();

    let in_flight = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    for n in 0..TOTAL {
        let in_flight = Arc::clone(&in_flight);
        let overlapped = Arc::clone(&overlapped);
        machine.add_transition(
            Transition::new(Tick::Tick, Counter(n), Counter(n + 1)).rule(FnRule::required(
                move || {
                    if in_flight.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    thread::yield_now();
                    in_flight.store(false, Ordering::SeqCst);
                    true
                },
            )),
        );
    }

    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        for _ in 0..THREADS {
            let tx = tx.clone();
            let machine = &machine;
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    let tx = tx.clone();
                    machine.process(
                        Tick::Tick,
                        Some(Box::new(move |result| {
                            let _ = tx.send(result);
                        })),
                    );
                }
            });
        }
    });
    drop(tx);

    let results: Vec<TransitionResult> = rx.iter().collect();
    assert_eq!(results.len(), TOTAL as usize);
    assert!(results.iter().all(|result| result.is_success()));
    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(machine.current_state(), Counter(TOTAL));

    let history = machine.history();
    let sequences: Vec<u64> = history.transitions().iter().map(|t| t.sequence).collect();
    let expected: Vec<u64> = (u64::from(TOTAL) - history.len() as u64 + 1..=u64::from(TOTAL)).collect();
    assert_eq!(sequences, expected);
}

#[test]
fn state_round_trips_through_memory_storage() {
    let machine = player();
    assert_eq!(machine.restored_state(), None);

    process_blocking(&machine, Control::EventA);
    machine.store_current_state().unwrap();
    assert_eq!(machine.restored_state(), Some(Player::Running));
    // Restoring never touches the live state.
    process_blocking(&machine, Control::EventStop);
    assert_eq!(machine.restored_state(), Some(Player::Running));
    assert_eq!(machine.current_state(), Player::Stopped);

    machine.clear_state_storage().unwrap();
    assert_eq!(machine.restored_state(), None);
}

#[test]
fn state_survives_in_file_storage() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let first: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Running)
        .storage(FileStorage::new(&path))
        .build()
        .unwrap();
    first.store_current_state().unwrap();

    let second: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .dispatcher(Inline)
        .storage(FileStorage::new(&path))
        .build()
        .unwrap();
    assert_eq!(second.restored_state(), Some(Player::Running));
    assert_eq!(second.current_state(), Player::Idle);

    second.clear_state_storage().unwrap();
    assert_eq!(first.restored_state(), None);
}

#[test]
fn unreadable_stored_state_restores_nothing() {
    let storage = MemoryStorage::new();
    storage.save(Some(serde_json::json!("NotAState"))).unwrap();

    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .storage(storage)
        .build()
        .unwrap();
    assert_eq!(machine.restored_state(), None);
}

#[test]
fn history_can_be_disabled() {
    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .config(MachineConfig {
            record_history: false,
            ..MachineConfig::default()
        })
        .build()
        .unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));

    process_blocking(&machine, Control::EventA);
    assert_eq!(machine.current_state(), Player::Running);
    assert!(machine.history().is_empty());
}

#[test]
fn checkpoint_resumes_on_a_new_machine() {
    let machine = player();
    process_blocking(&machine, Control::EventA);

    let json = machine.checkpoint().to_json().unwrap();
    let checkpoint = Checkpoint::<Player>::from_json(&json).unwrap();
    assert_eq!(checkpoint.machine_id, machine.id());
    assert_eq!(checkpoint.current_state, Player::Running);

    let resumed: StateMachine<Player, Control> = StateMachine::builder()
        .resume(checkpoint)
        .unwrap()
        .add_transition(Transition::new(
            Control::EventStop,
            Player::Running,
            Player::Stopped,
        ))
        .build()
        .unwrap();
    assert_eq!(resumed.current_state(), Player::Running);

    process_blocking(&resumed, Control::EventStop);
    let history = resumed.history();
    let path: Vec<Player> = history.get_path().into_iter().copied().collect();
    assert_eq!(path, vec![Player::Idle, Player::Running, Player::Stopped]);
    let sequences: Vec<u64> = history.transitions().iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[tokio::test]
async fn process_async_resolves_on_tokio_dispatcher() {
    init_tracing();
    let machine: StateMachine<Player, Control> = StateMachine::builder()
        .initial(Player::Idle)
        .dispatcher(TokioDispatcher::current())
        .build()
        .unwrap();
    machine.add_transition(Transition::new(
        Control::EventA,
        Player::Idle,
        Player::Running,
    ));

    assert_eq!(machine.process_async(Control::EventA).await, TransitionResult::Success);
    assert_eq!(machine.process_async(Control::EventA).await, TransitionResult::Failure);
    assert_eq!(machine.current_state(), Player::Running);
}

#[test]
fn try_process_accepts_events_while_lane_is_alive() {
    let machine = player();
    assert!(machine.try_process(Control::EventA, None).is_ok());
    assert_eq!(process_blocking(&machine, Control::EventStop), TransitionResult::Success);
}
