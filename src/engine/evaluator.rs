//! Two-tier rule evaluation.
//!
//! Rules are evaluated once each. Required rules decide whether the
//! transition may commit; every failing rule, required or not, has its
//! failure callback scheduled. Required failures are accumulated with
//! `Validation` so all of them are reported, not only the first.
//! A rule that panics while being checked counts as a failed required rule.

use crate::core::Rule;
use crate::delivery::extract_panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;
use tracing::error;

/// A required rule that did not pass.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Required rule #{index} did not pass")]
pub struct RuleViolation {
    /// Position of the rule in the transition's rule list
    pub index: usize,
}

/// Result of evaluating a transition's rules.
pub struct RuleEvaluation {
    verdict: Validation<(), NonEmptyVec<RuleViolation>>,
    optional_failing: Vec<Arc<dyn Rule>>,
    required_failing: Vec<Arc<dyn Rule>>,
}

impl RuleEvaluation {
    /// Whether the transition may commit.
    pub fn is_allowed(&self) -> bool {
        self.verdict.is_success()
    }

    /// Indices of the failing required rules.
    pub fn violations(&self) -> Vec<usize> {
        match &self.verdict {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().map(|v| v.index).collect(),
        }
    }

    /// Failing rules whose callbacks must fire: optional ones first, then
    /// required ones, each group in registration order.
    pub fn into_failing_rules(self) -> Vec<Arc<dyn Rule>> {
        let mut failing = self.optional_failing;
        failing.extend(self.required_failing);
        failing
    }
}

/// Evaluate `rules`. Absent rules always allow the transition.
pub fn evaluate(rules: Option<&[Arc<dyn Rule>]>) -> RuleEvaluation {
    let rules = rules.unwrap_or(&[]);

    let outcomes: Vec<(usize, &Arc<dyn Rule>, bool, bool)> = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let (allowed_to_fail, passed) = check(index, &**rule);
            (index, rule, allowed_to_fail, passed)
        })
        .collect();

    let (allowed_to_fail, required): (Vec<_>, Vec<_>) = outcomes
        .into_iter()
        .partition(|(_, _, allowed_to_fail, _)| *allowed_to_fail);

    let optional_failing = allowed_to_fail
        .iter()
        .filter(|(_, _, _, passed)| !passed)
        .map(|(_, rule, _, _)| Arc::clone(*rule))
        .collect();

    let checks: Vec<Validation<(), NonEmptyVec<RuleViolation>>> = required
        .iter()
        .map(|(index, _, _, passed)| {
            if *passed {
                Validation::success(())
            } else {
                Validation::fail(RuleViolation { index: *index })
            }
        })
        .collect();

    let required_failing = required
        .iter()
        .filter(|(_, _, _, passed)| !passed)
        .map(|(_, rule, _, _)| Arc::clone(*rule))
        .collect();

    RuleEvaluation {
        verdict: Validation::all_vec(checks).map(|_| ()),
        optional_failing,
        required_failing,
    }
}

/// Returns `(is_allowed_to_fail, passes)` for one rule.
fn check(index: usize, rule: &dyn Rule) -> (bool, bool) {
    match panic::catch_unwind(AssertUnwindSafe(|| (rule.is_allowed_to_fail(), rule.passes()))) {
        Ok(outcome) => outcome,
        Err(panic_info) => {
            error!(
                rule = index,
                panic = %extract_panic_message(&panic_info),
                "rule panicked, treating it as a failed required rule"
            );
            (false, false)
        }
    }
}
