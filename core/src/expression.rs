//! `MatchExpression` — Parsed `key=value` property rules
//!
//! Each entry of `entityProps` is parsed once, when criteria compile, into a
//! [`MatchExpression`]. Evaluation only ever sees the parsed form.
//!
//! # Grammar
//!
//! ```text
//! expression := key "=" expected
//! key        := any text before the first "=", trimmed, non-empty
//! expected   := any text after the first "=", trimmed ("*" means present)
//! ```

use crate::{CustomProperties, MatchError, MAX_EXPRESSION_LENGTH, WILDCARD};
use std::fmt;
use std::str::FromStr;

/// What a property value must look like for an expression to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedValue {
    /// `key=*`: the key must be present with a non-empty value.
    Present,
    /// `key=value`: the stored value must equal this exactly.
    ///
    /// Case-sensitive. The stored value is not trimmed.
    Exact(String),
}

impl ExpectedValue {
    /// Check a stored property value against this expectation.
    #[must_use]
    pub fn accepts(&self, actual: &str) -> bool {
        match self {
            Self::Present => !actual.is_empty(),
            Self::Exact(expected) => actual == expected,
        }
    }
}

/// A single property match rule.
///
/// # Example
///
/// ```
/// use evmatch::{ExpectedValue, MatchExpression};
///
/// let expr: MatchExpression = " owner = alice ".parse().unwrap();
/// assert_eq!(expr.key(), "owner");
/// assert_eq!(expr.expected(), &ExpectedValue::Exact("alice".into()));
///
/// let wildcard: MatchExpression = "tier=*".parse().unwrap();
/// assert_eq!(wildcard.expected(), &ExpectedValue::Present);
///
/// assert!("owner".parse::<MatchExpression>().is_err());
/// ```
///
/// [`parse`](Self::parse) is the only constructor, so the key is always
/// non-empty and [`Display`](fmt::Display) output always parses back to an
/// equal expression.
///
/// ```compile_fail
/// use evmatch::MatchExpression;
///
/// let _ = MatchExpression::exact("tier", "*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchExpression {
    key: String,
    expected: ExpectedValue,
}

impl MatchExpression {
    /// Parse a configured `key=value` string.
    ///
    /// Splits on the first `=` and trims whitespace on both sides of both parts.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MalformedExpression`] when there is no `=` or the
    /// key is empty, and [`MatchError::ExpressionTooLong`] past
    /// [`MAX_EXPRESSION_LENGTH`].
    pub fn parse(expression: &str) -> Result<Self, MatchError> {
        if expression.len() > MAX_EXPRESSION_LENGTH {
            return Err(MatchError::ExpressionTooLong {
                len: expression.len(),
                max: MAX_EXPRESSION_LENGTH,
            });
        }

        let (key, value) =
            expression
                .split_once('=')
                .ok_or_else(|| MatchError::MalformedExpression {
                    expression: expression.to_owned(),
                    reason: "missing '=' between key and value",
                })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(MatchError::MalformedExpression {
                expression: expression.to_owned(),
                reason: "empty key before '='",
            });
        }

        let value = value.trim();
        let expected = if value == WILDCARD {
            ExpectedValue::Present
        } else {
            ExpectedValue::Exact(value.to_owned())
        };

        Ok(Self {
            key: key.to_owned(),
            expected,
        })
    }

    /// The property key this expression inspects.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The expectation on the property value.
    #[must_use]
    pub fn expected(&self) -> &ExpectedValue {
        &self.expected
    }

    /// Returns `true` for `key=*` expressions.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.expected == ExpectedValue::Present
    }

    /// Evaluate this expression against a property mapping.
    ///
    /// A missing key never matches.
    #[must_use]
    pub fn matches(&self, properties: &CustomProperties) -> bool {
        properties
            .get(&self.key)
            .is_some_and(|actual| self.expected.accepts(actual))
    }
}

impl FromStr for MatchExpression {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expected {
            ExpectedValue::Present => write!(f, "{}={WILDCARD}", self.key),
            ExpectedValue::Exact(v) => write!(f, "{}={v}", self.key),
        }
    }
}
