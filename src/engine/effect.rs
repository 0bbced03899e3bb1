//! Post-commit effect hook.
//!
//! The effect is the machine's presentation target: navigation, object-graph
//! setup, or anything else that reacts to a committed state. It is handed
//! values only and runs on the delivery context.

use crate::core::{Event, State};

/// Side effect invoked once per committed transition.
///
/// Errors are logged by the engine and otherwise ignored.
///
/// Closures of the form `Fn(&S, &E) -> anyhow::Result<()>` implement this
/// trait directly.
pub trait TransitionEffect<S: State, E: Event>: Send + Sync {
    fn on_transition(&self, state: &S, event: &E) -> anyhow::Result<()>;
}

impl<S, E, F> TransitionEffect<S, E> for F
where
    S: State,
    E: Event,
    F: Fn(&S, &E) -> anyhow::Result<()> + Send + Sync,
{
    fn on_transition(&self, state: &S, event: &E) -> anyhow::Result<()> {
        self(state, event)
    }
}
