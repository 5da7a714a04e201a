//! Predicates — Decide whether a metadata-change event is relevant
//!
//! The chain is built by composition:
//!
//! ```text
//! PropValuePredicate ── owns ──▶ EntityTypePredicate ── shares ──▶ Arc<MatchCriteria>
//! ```
//!
//! The entity-type check always runs first. The property checks only run
//! when it passes.

use crate::{
    CustomProperties, MatchCriteria, MatchError, MetadataChangeEvent, PredicateTrace, TraceStep,
};
use std::fmt::Debug;
use std::sync::Arc;

/// Outcome of evaluating one event.
///
/// `NoMatch` is ordinary control flow, never an error, and never carries data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The event does not satisfy the criteria.
    NoMatch,
    /// The event satisfies the criteria.
    Match {
        /// Custom properties surfaced by a property check, if one ran.
        properties: Option<CustomProperties>,
    },
}

impl MatchResult {
    /// A match that extracted nothing.
    #[must_use]
    pub fn matched() -> Self {
        Self::Match { properties: None }
    }

    /// A match carrying the custom properties that satisfied it.
    #[must_use]
    pub fn with_properties(properties: CustomProperties) -> Self {
        Self::Match {
            properties: Some(properties),
        }
    }

    /// Returns `true` for `Match`.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// Extracted properties, if any.
    #[must_use]
    pub fn properties(&self) -> Option<&CustomProperties> {
        match self {
            Self::Match { properties } => properties.as_ref(),
            Self::NoMatch => None,
        }
    }

    /// Consume the result, returning the extracted properties, if any.
    #[must_use]
    pub fn into_properties(self) -> Option<CustomProperties> {
        match self {
            Self::Match { properties } => properties,
            Self::NoMatch => None,
        }
    }
}

/// Decides whether an event is relevant.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`: one predicate instance serves
/// concurrent evaluations without locking.
///
/// # Example
///
/// ```
/// use evmatch::{EventPredicate, MatchError, MatchResult, MetadataChangeEvent};
///
/// #[derive(Debug)]
/// struct HasAspect;
///
/// impl EventPredicate for HasAspect {
///     fn matches(&self, event: &MetadataChangeEvent) -> Result<MatchResult, MatchError> {
///         Ok(if event.aspect.is_some() { MatchResult::matched() } else { MatchResult::NoMatch })
///     }
/// }
///
/// assert!(!HasAspect.matches(&MetadataChangeEvent::new()).unwrap().is_match());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `EventPredicate`",
    label = "this type cannot decide whether an event matches",
    note = "implement `matches(&self, &MetadataChangeEvent) -> Result<MatchResult, MatchError>`"
)]
pub trait EventPredicate: Send + Sync + Debug {
    /// Evaluate the event.
    ///
    /// # Errors
    ///
    /// Returns a data error ([`MatchError::is_data_error`]) when the event
    /// payload is corrupt. Failing criteria yield `Ok(MatchResult::NoMatch)`.
    fn matches(&self, event: &MetadataChangeEvent) -> Result<MatchResult, MatchError>;

    /// Evaluate the event and record every check performed.
    ///
    /// The default records no steps, only the result.
    ///
    /// # Errors
    ///
    /// Same as [`matches`](Self::matches).
    fn matches_with_trace(&self, event: &MetadataChangeEvent) -> Result<PredicateTrace, MatchError> {
        let result = self.matches(event)?;
        Ok(PredicateTrace::new(result.is_match(), Vec::new()))
    }

    /// Match type this predicate is bound to, if any.
    fn match_type(&self) -> Option<&str> {
        None
    }

    /// Returns `true` if this predicate applies to its configuration's match type.
    ///
    /// Default is `true`: a predicate with no criteria applies everywhere.
    fn matches_type(&self) -> bool {
        true
    }
}

// Blanket implementation for boxed predicates
#[diagnostic::do_not_recommend]
impl EventPredicate for Box<dyn EventPredicate> {
    fn matches(&self, event: &MetadataChangeEvent) -> Result<MatchResult, MatchError> {
        (**self).matches(event)
    }

    fn matches_with_trace(&self, event: &MetadataChangeEvent) -> Result<PredicateTrace, MatchError> {
        (**self).matches_with_trace(event)
    }

    fn match_type(&self) -> Option<&str> {
        (**self).match_type()
    }

    fn matches_type(&self) -> bool {
        (**self).matches_type()
    }
}

/// Matches every event and extracts nothing.
///
/// What a notification with no criteria configured evaluates to.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyEvent;

impl EventPredicate for AnyEvent {
    fn matches(&self, _event: &MetadataChangeEvent) -> Result<MatchResult, MatchError> {
        Ok(MatchResult::matched())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entity type
// ═══════════════════════════════════════════════════════════════════════════════

/// Filters events by entity type against the criteria's allow-list.
///
/// - Empty allow-list → every event passes
/// - Missing or unlisted `entityType` → `NoMatch`
///
/// Never extracts properties.
#[derive(Debug, Clone)]
pub struct EntityTypePredicate {
    criteria: Arc<MatchCriteria>,
    match_type: Option<String>,
}

impl EntityTypePredicate {
    /// Create an entity-type predicate over shared criteria.
    #[must_use]
    pub fn new(criteria: Arc<MatchCriteria>) -> Self {
        Self {
            criteria,
            match_type: None,
        }
    }

    /// Bind this predicate to a match type (builder pattern).
    #[must_use]
    pub fn bound_to(mut self, match_type: impl Into<String>) -> Self {
        self.match_type = Some(match_type.into());
        self
    }

    /// The criteria this predicate reads.
    #[must_use]
    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    fn check(&self, event: &MetadataChangeEvent) -> bool {
        let allowed = self.criteria.allows_entity_type(event.entity_type());
        if !allowed {
            tracing::debug!(
                entity_type = event.entity_type().unwrap_or("<missing>"),
                "entity type not in allow-list"
            );
        }
        allowed
    }

    fn trace_step(&self, event: &MetadataChangeEvent) -> TraceStep {
        TraceStep::EntityType {
            matched: self.criteria.allows_entity_type(event.entity_type()),
            actual: event.entity_type.clone(),
            allowed: self.criteria.entity_types().to_vec(),
        }
    }
}

impl EventPredicate for EntityTypePredicate {
    fn matches(&self, event: &MetadataChangeEvent) -> Result<MatchResult, MatchError> {
        if self.check(event) {
            Ok(MatchResult::matched())
        } else {
            Ok(MatchResult::NoMatch)
        }
    }

    fn matches_with_trace(&self, event: &MetadataChangeEvent) -> Result<PredicateTrace, MatchError> {
        let step = self.trace_step(event);
        Ok(PredicateTrace::new(step.passed(), vec![step]))
    }

    fn match_type(&self) -> Option<&str> {
        self.match_type.as_deref()
    }

    fn matches_type(&self) -> bool {
        self.match_type.as_deref() == self.criteria.match_type()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Property value
// ═══════════════════════════════════════════════════════════════════════════════

/// Filters events by aspect and custom property values.
///
/// Owns an [`EntityTypePredicate`] and requires it to pass first (logical AND).
/// Then, only when the criteria carry property expressions:
///
/// 1. The event's `aspectName` must equal the bound aspect name
/// 2. The event must carry `aspect.value`
/// 3. The value is un-escaped and decoded; its `customProperties` is the candidate mapping
/// 4. Every expression must pass (first failure short-circuits)
///
/// On success the candidate mapping is returned as the extracted properties.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use evmatch::prelude::*;
///
/// let config = MatchConfig::new().with_entity_props(["tier=*"]);
/// let criteria = Arc::new(MatchCriteria::compile(&config).unwrap());
/// let predicate = PropValuePredicate::new(criteria, "datasetProperties");
///
/// let event = MetadataChangeEvent::new()
///     .with_aspect_name("datasetProperties")
///     .with_aspect_value(r#"{"customProperties":{"tier":""}}"#);
///
/// // Wildcard requires a non-empty value.
/// assert_eq!(predicate.matches(&event).unwrap(), MatchResult::NoMatch);
/// ```
#[derive(Debug, Clone)]
pub struct PropValuePredicate {
    entity: EntityTypePredicate,
    aspect_name: String,
}

impl PropValuePredicate {
    /// Create a property predicate over shared criteria, bound to `aspect_name`.
    #[must_use]
    pub fn new(criteria: Arc<MatchCriteria>, aspect_name: impl Into<String>) -> Self {
        Self::wrap(EntityTypePredicate::new(criteria), aspect_name)
    }

    /// Wrap an existing entity-type predicate, keeping its match type binding.
    #[must_use]
    pub fn wrap(entity: EntityTypePredicate, aspect_name: impl Into<String>) -> Self {
        Self {
            entity,
            aspect_name: aspect_name.into(),
        }
    }

    /// Bind this predicate to a match type (builder pattern).
    #[must_use]
    pub fn bound_to(mut self, match_type: impl Into<String>) -> Self {
        self.entity = self.entity.bound_to(match_type);
        self
    }

    /// The aspect this predicate inspects.
    #[must_use]
    pub fn aspect_name(&self) -> &str {
        &self.aspect_name
    }

    /// The wrapped entity-type predicate.
    #[must_use]
    pub fn entity(&self) -> &EntityTypePredicate {
        &self.entity
    }

    fn criteria(&self) -> &MatchCriteria {
        self.entity.criteria()
    }

    fn aspect_name_matches(&self, event: &MetadataChangeEvent) -> bool {
        event.aspect_name() == Some(self.aspect_name.as_str())
    }

    fn decode(&self, event: &MetadataChangeEvent) -> Result<Option<CustomProperties>, MatchError> {
        let Some(aspect) = event.aspect.as_ref() else {
            return Ok(None);
        };
        aspect.custom_properties(&self.aspect_name).inspect_err(|e| {
            tracing::warn!(aspect = %self.aspect_name, error = %e, "aspect payload is malformed");
        })
    }
}

impl EventPredicate for PropValuePredicate {
    fn matches(&self, event: &MetadataChangeEvent) -> Result<MatchResult, MatchError> {
        if !self.entity.matches(event)?.is_match() {
            return Ok(MatchResult::NoMatch);
        }

        let expressions = self.criteria().expressions();
        if expressions.is_empty() {
            return Ok(MatchResult::matched());
        }

        if !self.aspect_name_matches(event) {
            tracing::trace!(
                expected = %self.aspect_name,
                actual = event.aspect_name().unwrap_or("<missing>"),
                "aspect name differs"
            );
            return Ok(MatchResult::NoMatch);
        }

        let Some(properties) = self.decode(event)? else {
            tracing::debug!(aspect = %self.aspect_name, "event carries no aspect value");
            return Ok(MatchResult::NoMatch);
        };

        if let Some(failed) = expressions.iter().find(|e| !e.matches(&properties)) {
            tracing::debug!(aspect = %self.aspect_name, expression = %failed, "property expression failed");
            return Ok(MatchResult::NoMatch);
        }

        Ok(MatchResult::with_properties(properties))
    }

    fn matches_with_trace(&self, event: &MetadataChangeEvent) -> Result<PredicateTrace, MatchError> {
        let mut steps = vec![self.entity.trace_step(event)];
        if !steps[0].passed() {
            return Ok(PredicateTrace::new(false, steps));
        }

        let expressions = self.criteria().expressions();
        if expressions.is_empty() {
            return Ok(PredicateTrace::new(true, steps));
        }

        let name_matched = self.aspect_name_matches(event);
        steps.push(TraceStep::AspectName {
            matched: name_matched,
            actual: event.aspect_name.clone(),
            expected: self.aspect_name.clone(),
        });
        if !name_matched {
            return Ok(PredicateTrace::new(false, steps));
        }

        let properties = self.decode(event)?;
        steps.push(TraceStep::AspectValue {
            present: properties.is_some(),
        });
        let Some(properties) = properties else {
            return Ok(PredicateTrace::new(false, steps));
        };

        let mut matched = true;
        for expression in expressions {
            let passed = expression.matches(&properties);
            matched &= passed;
            steps.push(TraceStep::Expression {
                matched: passed,
                expression: expression.to_string(),
                actual: properties.get(expression.key()).cloned(),
            });
        }

        Ok(PredicateTrace::new(matched, steps))
    }

    fn match_type(&self) -> Option<&str> {
        self.entity.match_type()
    }

    fn matches_type(&self) -> bool {
        self.entity.matches_type()
    }
}
