//! Config types for match criteria and predicate chains.
//!
//! These types are serde-deserializable and mirror what an operator writes.
//! They compile into runtime types once, at load time:
//!
//! | Config type | Runtime type | Compiler |
//! |-------------|-------------|----------|
//! | [`MatchConfig`] | [`MatchCriteria`] | [`MatchCriteria::compile()`] |
//! | [`NotificationConfig`] | [`Dispatcher`](crate::Dispatcher) | [`Dispatcher::from_config()`](crate::Dispatcher::from_config) |
//! | [`ChainConfig`] | `Box<dyn EventPredicate>` | [`ChainConfig::build()`] |

use crate::{
    EntityTypePredicate, EventPredicate, MatchError, MatchExpression, PropValuePredicate,
    MAX_ENTITY_TYPES, MAX_EXPRESSIONS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw match criteria as configured.
///
/// Accepts camelCase or snake_case field names:
///
/// ```yaml
/// entityTypes: [dataset, chart]
/// entityProps: ["owner=alice", "tier=*"]
/// matchType: properties
/// ```
///
/// An absent list and an empty list mean the same thing: no filtering at that layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    /// Entity type allow-list.
    #[serde(default, alias = "entity_types", skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<String>>,

    /// Property expressions, each `key=value` or `key=*`.
    #[serde(default, alias = "entity_props", skip_serializing_if = "Option::is_none")]
    pub entity_props: Option<Vec<String>>,

    /// Classification tag used to select predicate chains.
    #[serde(default, alias = "match_type", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
}

impl MatchConfig {
    /// Create an empty configuration (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entity type allow-list (builder pattern).
    #[must_use]
    pub fn with_entity_types<I, S>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types = Some(entity_types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the property expressions (builder pattern).
    #[must_use]
    pub fn with_entity_props<I, S>(mut self, entity_props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_props = Some(entity_props.into_iter().map(Into::into).collect());
        self
    }

    /// Set the match type (builder pattern).
    #[must_use]
    pub fn with_match_type(mut self, match_type: impl Into<String>) -> Self {
        self.match_type = Some(match_type.into());
        self
    }
}

/// Compiled, validated match criteria.
///
/// Immutable once constructed. Predicates share one instance through `Arc`
/// and never mutate it, so concurrent evaluation needs no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCriteria {
    entity_types: Vec<String>,
    expressions: Vec<MatchExpression>,
    match_type: Option<String>,
}

impl MatchCriteria {
    /// Criteria that accept every event.
    #[must_use]
    pub fn unconditional() -> Self {
        Self::default()
    }

    /// Compile and validate a raw configuration.
    ///
    /// Every property expression is parsed here, so a malformed one fails
    /// at load time instead of on the first event that reaches it.
    ///
    /// # Errors
    ///
    /// - [`MatchError::MalformedExpression`] / [`MatchError::ExpressionTooLong`]
    ///   for a bad `key=value` entry
    /// - [`MatchError::TooManyExpressions`] / [`MatchError::TooManyEntityTypes`]
    ///   when a list exceeds its limit
    pub fn compile(config: &MatchConfig) -> Result<Self, MatchError> {
        let entity_types = config.entity_types.clone().unwrap_or_default();
        if entity_types.len() > MAX_ENTITY_TYPES {
            return Err(MatchError::TooManyEntityTypes {
                count: entity_types.len(),
                max: MAX_ENTITY_TYPES,
            });
        }

        let raw = config.entity_props.as_deref().unwrap_or_default();
        if raw.len() > MAX_EXPRESSIONS {
            return Err(MatchError::TooManyExpressions {
                count: raw.len(),
                max: MAX_EXPRESSIONS,
            });
        }
        let expressions = raw
            .iter()
            .map(|e| MatchExpression::parse(e))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entity_types,
            expressions,
            match_type: config.match_type.clone(),
        })
    }

    /// Entity type allow-list. Empty means every entity type passes.
    #[must_use]
    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    /// Parsed property expressions. Empty means property filtering is off.
    #[must_use]
    pub fn expressions(&self) -> &[MatchExpression] {
        &self.expressions
    }

    /// The configured match type.
    #[must_use]
    pub fn match_type(&self) -> Option<&str> {
        self.match_type.as_deref()
    }

    /// Returns `true` if `entity_type` passes the allow-list.
    #[must_use]
    pub fn allows_entity_type(&self, entity_type: Option<&str>) -> bool {
        if self.entity_types.is_empty() {
            return true;
        }
        entity_type.is_some_and(|t| self.entity_types.iter().any(|allowed| allowed == t))
    }
}

/// One predicate chain in a [`NotificationConfig`].
///
/// A chain with an `aspectName` compiles to a [`PropValuePredicate`] bound to
/// that aspect; a chain without one compiles to an [`EntityTypePredicate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Match type this chain is bound to.
    #[serde(alias = "match_type")]
    pub match_type: String,

    /// Aspect the property checks apply to.
    #[serde(default, alias = "aspect_name", skip_serializing_if = "Option::is_none")]
    pub aspect_name: Option<String>,
}

impl ChainConfig {
    /// Build the runtime predicate for this chain over shared criteria.
    #[must_use]
    pub fn build(&self, criteria: &Arc<MatchCriteria>) -> Box<dyn EventPredicate> {
        let entity = EntityTypePredicate::new(Arc::clone(criteria)).bound_to(&self.match_type);
        match &self.aspect_name {
            Some(aspect_name) => Box::new(PropValuePredicate::wrap(entity, aspect_name)),
            None => Box::new(entity),
        }
    }
}

/// A notification entry: match criteria plus the predicate chains that may
/// apply to it.
///
/// ```yaml
/// matchType: properties
/// entityTypes: [dataset]
/// entityProps: ["tier=gold"]
/// chains:
///   - matchType: entity
///   - matchType: properties
///     aspectName: datasetProperties
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Shared match criteria.
    #[serde(flatten)]
    pub criteria: MatchConfig,

    /// Candidate predicate chains, in evaluation order.
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}
