//! Statelane: a thread-safe, rule-guarded state machine engine
//!
//! Events are processed one at a time on a dedicated processing lane.
//! Before a transition commits, its rules are checked: a failing required
//! rule blocks the transition, a failing optional rule only reports itself.
//! Outcomes and rule-failure callbacks are delivered on a pluggable
//! delivery context, never on the caller's thread.
//!
//! # Core Concepts
//!
//! - **State / Event**: identity types via the `State` and `Event` traits
//! - **Transition**: `(event, source) -> destination`, optionally guarded by rules
//! - **Rule**: a predicate that is either required or allowed to fail
//! - **Dispatcher**: where completion callbacks run
//! - **History**: immutable record of committed transitions
//!
//! # Example
//!
//! ```rust
//! use statelane::core::FnRule;
//! use statelane::delivery::Inline;
//! use statelane::engine::{StateMachine, Transition, TransitionResult};
//! use statelane::{event_enum, state_enum};
//! use std::sync::mpsc;
//!
//! state_enum! {
//!     enum Door { Closed, Open, Locked }
//! }
//!
//! event_enum! {
//!     enum Action { Open, Close, Lock }
//! }
//!
//! let machine: StateMachine<Door, Action> = StateMachine::builder()
//!     .initial(Door::Closed)
//!     .dispatcher(Inline)
//!     .build()
//!     .unwrap();
//!
//! machine.add_transition(Transition::new(Action::Open, Door::Closed, Door::Open));
//! machine.add_transition(Transition::new(Action::Close, Door::Open, Door::Closed));
//! machine.add_transition(
//!     Transition::new(Action::Lock, Door::Closed, Door::Locked)
//!         .rule(FnRule::required(|| false)),
//! );
//!
//! let (tx, rx) = mpsc::channel();
//! let report = tx.clone();
//! machine.process(Action::Lock, Some(Box::new(move |result| report.send(result).unwrap())));
//! machine.process(Action::Open, Some(Box::new(move |result| tx.send(result).unwrap())));
//!
//! assert_eq!(rx.recv().unwrap(), TransitionResult::Failure);
//! assert_eq!(rx.recv().unwrap(), TransitionResult::Success);
//! assert_eq!(machine.current_state(), Door::Open);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod delivery;
pub mod engine;
pub mod storage;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder, TransitionBuilder};
pub use checkpoint::Checkpoint;
pub use config::MachineConfig;
pub use core::{Event, FnRule, Rule, State, StateHistory, StateTransition};
pub use delivery::{Dispatcher, Inline, SerialQueue, TokioDispatcher};
pub use engine::{MachineError, StateMachine, Transition, TransitionEffect, TransitionResult};
pub use storage::{FileStorage, MemoryStorage, StateStorage, StorageError};
