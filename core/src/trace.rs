//! Evaluation trace types for debugging predicate decisions.
//!
//! A [`PredicateTrace`] records each check a predicate chain performed, in
//! order, and the overall result. Use
//! [`EventPredicate::matches_with_trace()`](crate::EventPredicate::matches_with_trace)
//! to see why an event was accepted or rejected.
//!
//! # Example
//!
//! ```ignore
//! let trace = predicate.matches_with_trace(&event)?;
//! for step in &trace.steps {
//!     println!("{step:?}");
//! }
//! ```

use serde::Serialize;

/// Trace of one predicate chain evaluation.
///
/// # INV: `matched` == `matches()` result
///
/// Expression checks are all evaluated (no short-circuit), but `matched`
/// is always what
/// [`matches()`](crate::EventPredicate::matches) would have decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateTrace {
    /// Whether the chain matched.
    pub matched: bool,
    /// Checks performed, in evaluation order.
    pub steps: Vec<TraceStep>,
}

impl PredicateTrace {
    /// Create a trace from a result and the steps that produced it.
    #[must_use]
    pub fn new(matched: bool, steps: Vec<TraceStep>) -> Self {
        Self { matched, steps }
    }

    /// The first step that failed, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&TraceStep> {
        self.steps.iter().find(|s| !s.passed())
    }
}

/// One check inside a predicate chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TraceStep {
    /// Entity type against the allow-list.
    EntityType {
        /// Whether the check passed.
        matched: bool,
        /// Entity type carried by the event.
        actual: Option<String>,
        /// Configured allow-list (empty = any).
        allowed: Vec<String>,
    },
    /// Event aspect name against the predicate's bound aspect.
    AspectName {
        /// Whether the check passed.
        matched: bool,
        /// Aspect name carried by the event.
        actual: Option<String>,
        /// Aspect the predicate is bound to.
        expected: String,
    },
    /// Presence of an aspect value to decode.
    AspectValue {
        /// Whether the event carried `aspect.value`.
        present: bool,
    },
    /// One property expression against the decoded custom properties.
    Expression {
        /// Whether the expression passed.
        matched: bool,
        /// The expression, rendered as `key=value`.
        expression: String,
        /// Value stored under the expression's key.
        actual: Option<String>,
    },
}

impl TraceStep {
    /// Whether this check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        match self {
            Self::EntityType { matched, .. }
            | Self::AspectName { matched, .. }
            | Self::Expression { matched, .. } => *matched,
            Self::AspectValue { present } => *present,
        }
    }
}
