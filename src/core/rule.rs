//! Rules guarding transitions.
//!
//! A rule is checked when its transition is about to commit. Required rules
//! block the commit when they fail; rules that are allowed to fail only
//! report through their failure callback.

use std::fmt;
use std::sync::Arc;

/// Callback invoked on the delivery context when a rule does not pass.
pub type FailureCallback = Arc<dyn Fn() + Send + Sync>;

/// Guard evaluated at commit time.
///
/// `passes` is called exactly once per processing attempt and may read
/// external, time-varying state. `on_failure` runs later on the machine's
/// delivery context, never on the processing lane.
///
/// # Example
///
/// ```rust
/// use statelane::core::Rule;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct SignedIn(AtomicBool);
///
/// impl Rule for SignedIn {
///     fn is_allowed_to_fail(&self) -> bool {
///         false
///     }
///
///     fn passes(&self) -> bool {
///         self.0.load(Ordering::SeqCst)
///     }
/// }
///
/// let rule = SignedIn(AtomicBool::new(false));
/// assert!(!rule.passes());
/// ```
pub trait Rule: Send + Sync {
    /// Whether a failure of this rule still lets the transition commit.
    fn is_allowed_to_fail(&self) -> bool;

    /// Invoked when the rule did not pass. Default does nothing.
    fn on_failure(&self) {}

    /// Evaluate the rule.
    fn passes(&self) -> bool;
}

/// Rule backed by a closure.
///
/// # Example
///
/// ```rust
/// use statelane::core::{FnRule, Rule};
///
/// let rule = FnRule::optional(|| false)
///     .with_failure_callback(|| println!("analytics consent missing"));
///
/// assert!(rule.is_allowed_to_fail());
/// assert!(!rule.passes());
/// ```
pub struct FnRule {
    predicate: Box<dyn Fn() -> bool + Send + Sync>,
    allowed_to_fail: bool,
    on_failure: Option<FailureCallback>,
}

impl FnRule {
    /// Create a rule that blocks the transition when it fails.
    pub fn required<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            allowed_to_fail: false,
            on_failure: None,
        }
    }

    /// Create a rule whose failure does not block the transition.
    pub fn optional<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            allowed_to_fail: true,
            on_failure: None,
        }
    }

    /// Set the callback fired when the rule fails.
    pub fn with_failure_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }
}

impl Rule for FnRule {
    fn is_allowed_to_fail(&self) -> bool {
        self.allowed_to_fail
    }

    fn on_failure(&self) {
        if let Some(callback) = &self.on_failure {
            callback();
        }
    }

    fn passes(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("allowed_to_fail", &self.allowed_to_fail)
            .field("has_failure_callback", &self.on_failure.is_some())
            .finish()
    }
}
