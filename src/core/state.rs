//! State and event traits for machine configurations and triggers.
//!
//! States identify a machine configuration and must be serializable so the
//! current state can be persisted as a single scalar. Events are opaque
//! triggers resolved against the transition table.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// States are plain values: identity and equality are all the engine relies
/// on. They are hashed and compared while resolving transitions and
/// serialized when the current state is stored.
///
/// # Required Traits
///
/// - `Clone`: states are copied out of the machine on every read
/// - `Eq` + `Hash`: states key transition lookups
/// - `Debug`: states appear in diagnostics
/// - `Serialize` + `Deserialize`: states are persisted and checkpointed
///
/// # Example
///
/// ```rust
/// use statelane::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Screen {
///     Splash,
///     Login,
///     Home,
/// }
///
/// impl State for Screen {
///     fn name(&self) -> &str {
///         match self {
///             Self::Splash => "Splash",
///             Self::Login => "Login",
///             Self::Home => "Home",
///         }
///     }
/// }
///
/// assert_eq!(Screen::Login.name(), "Login");
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Purely informational: the engine still processes events registered
    /// from a final state. Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Trait for events that trigger transitions.
///
/// An event may map to several transitions, one per source state.
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the event's name for display/logging.
    fn name(&self) -> &str;
}
