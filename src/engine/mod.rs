//! The state machine engine.
//!
//! Three lanes keep the engine race-free:
//! - **Registration**: a mutex-guarded `TransitionTable`
//! - **Processing**: one thread resolving, checking rules and committing
//!   events in submission order
//! - **Delivery**: a pluggable `Dispatcher` running every callback
//!
//! `StateMachine` is the public surface tying them together.

mod effect;
mod error;
mod evaluator;
mod machine;
mod processor;
mod table;
mod transition;

pub use effect::TransitionEffect;
pub use error::MachineError;
pub use evaluator::{evaluate, RuleEvaluation, RuleViolation};
pub use machine::StateMachine;
pub use table::TransitionTable;
pub use transition::{Completion, Transition, TransitionResult};

pub(crate) use machine::MachineParts;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

pub(crate) fn read_recover<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("state lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

pub(crate) fn write_recover<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("state lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
