//! evmatch - predicate chains for metadata-change events
//!
//! Decides whether a metadata-change event is relevant to a configured
//! notification, and if so surfaces the custom properties it carries.
//!
//! # Architecture
//!
//! - [`MatchConfig`] — Raw, serde-deserializable criteria (what the user wrote)
//! - [`MatchCriteria`] — Compiled criteria, shared read-only via `Arc`
//! - [`MatchExpression`] — A parsed `key=value` / `key=*` rule
//! - [`MetadataChangeEvent`] — Typed event record (outer decode)
//! - [`EventPredicate`] — The predicate contract: `matches` + `matches_type`
//! - [`EntityTypePredicate`] — Entity type allow-list
//! - [`PropValuePredicate`] — Wraps an entity-type predicate, adds aspect + property checks
//! - [`Dispatcher`] — Selects chains by match type, first-match-wins
//!
//! # Key Design Insights
//!
//! 1. **Composition, not layering by inheritance**: `PropValuePredicate` owns an
//!    `EntityTypePredicate` and consults it first.
//!
//! 2. **Parse once**: match expressions are parsed and validated when the
//!    criteria compile. Evaluation never re-parses configuration.
//!
//! 3. **No match is not an error**: [`MatchResult::NoMatch`] is ordinary
//!    control flow. A corrupt aspect payload is a [`MatchError`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use evmatch::prelude::*;
//!
//! let config = MatchConfig::new()
//!     .with_entity_types(["dataset"])
//!     .with_entity_props(["owner=alice"]);
//! let criteria = Arc::new(MatchCriteria::compile(&config).unwrap());
//! let predicate = PropValuePredicate::new(criteria, "ownership");
//!
//! let event = MetadataChangeEvent::new()
//!     .with_entity_type("dataset")
//!     .with_aspect_name("ownership")
//!     .with_aspect_value(r#"{"customProperties":{"owner":"alice"}}"#);
//!
//! let result = predicate.matches(&event).unwrap();
//! assert!(result.is_match());
//! assert_eq!(result.properties().unwrap()["owner"], "alice");
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod config;
mod dispatcher;
mod event;
mod expression;
mod predicate;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use config::{ChainConfig, MatchConfig, MatchCriteria, NotificationConfig};
pub use dispatcher::{ChainTrace, Dispatch, DispatchTrace, Dispatcher};
pub use event::{unescape_payload, Aspect, CustomProperties, MetadataChangeEvent};
pub use expression::{ExpectedValue, MatchExpression};
pub use predicate::{AnyEvent, EntityTypePredicate, EventPredicate, MatchResult, PropValuePredicate};
pub use trace::{PredicateTrace, TraceStep};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use evmatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Predicates
        AnyEvent,
        // Events
        Aspect,
        CustomProperties,
        // Dispatch
        Dispatch,
        Dispatcher,
        EntityTypePredicate,
        EventPredicate,
        // Expressions
        ExpectedValue,
        // Config types
        MatchConfig,
        MatchCriteria,
        // Errors
        MatchError,
        MatchExpression,
        MatchResult,
        MetadataChangeEvent,
        NotificationConfig,
        // Trace types
        PredicateTrace,
        PropValuePredicate,
        TraceStep,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of property match expressions in one configuration.
///
/// Validated when [`MatchCriteria`] compiles.
pub const MAX_EXPRESSIONS: usize = 256;

/// Maximum number of entries in the entity type allow-list.
pub const MAX_ENTITY_TYPES: usize = 256;

/// Maximum length of a single `key=value` expression, in bytes.
pub const MAX_EXPRESSION_LENGTH: usize = 8192;

/// Value of a match expression that accepts any non-empty property value.
pub const WILDCARD: &str = "*";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from criteria compilation and event evaluation.
///
/// Two classes:
///
/// - Configuration errors ([`is_config_error`](Self::is_config_error)) are
///   raised when criteria compile. Fix the configuration and recompile.
/// - Data errors ([`is_data_error`](Self::is_data_error)) are raised during
///   evaluation when an event or its aspect payload is corrupt. They are
///   distinct from [`MatchResult::NoMatch`], which is not an error at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// A property expression is not of the form `key=value`.
    #[error("malformed match expression \"{expression}\": {reason}")]
    MalformedExpression {
        /// The expression as configured.
        expression: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Too many property expressions in one configuration.
    #[error("configuration has {count} match expressions, but maximum allowed is {max}")]
    TooManyExpressions {
        /// Actual count of expressions.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Too many entity types in the allow-list.
    #[error("configuration has {count} entity types, but maximum allowed is {max}")]
    TooManyEntityTypes {
        /// Actual count of entity types.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A property expression exceeds [`MAX_EXPRESSION_LENGTH`].
    #[error("match expression length is {len}, but maximum allowed is {max}")]
    ExpressionTooLong {
        /// Actual length of the expression.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The notification configuration is structurally invalid.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// What is wrong with it.
        message: String,
    },

    /// The event itself could not be decoded.
    #[error("malformed event: {message}")]
    MalformedEvent {
        /// The underlying decode error.
        message: String,
    },

    /// The aspect payload could not be decoded into custom properties.
    #[error("malformed payload in aspect \"{aspect_name}\": {message}")]
    MalformedPayload {
        /// The aspect whose payload is corrupt.
        aspect_name: String,
        /// The underlying decode error.
        message: String,
    },
}

impl MatchError {
    /// Returns `true` if this error comes from configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedExpression { .. }
                | Self::TooManyExpressions { .. }
                | Self::TooManyEntityTypes { .. }
                | Self::ExpressionTooLong { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Returns `true` if this error comes from the event data.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedEvent { .. } | Self::MalformedPayload { .. }
        )
    }
}
