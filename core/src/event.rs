//! Metadata-change events and their aspect payloads.
//!
//! Decoding happens in two stages so failures stay separable:
//!
//! 1. [`MetadataChangeEvent::from_json`] decodes the outer event
//!    ([`MatchError::MalformedEvent`]).
//! 2. [`Aspect::custom_properties`] un-escapes and decodes the aspect's
//!    embedded JSON ([`MatchError::MalformedPayload`]).

use crate::MatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Property mapping carried in an aspect's `customProperties`.
pub type CustomProperties = BTreeMap<String, String>;

/// A metadata-change event.
///
/// Every field is optional: a missing field makes the relevant predicate
/// step fail, it never makes decoding fail. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataChangeEvent {
    /// Kind of entity the change concerns (e.g. `"dataset"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Name of the aspect that changed (e.g. `"datasetProperties"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_name: Option<String>,

    /// The changed aspect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<Aspect>,
}

impl MetadataChangeEvent {
    /// Create an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entity type (builder pattern).
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Set the aspect name (builder pattern).
    #[must_use]
    pub fn with_aspect_name(mut self, aspect_name: impl Into<String>) -> Self {
        self.aspect_name = Some(aspect_name.into());
        self
    }

    /// Attach an aspect carrying the given JSON-encoded value (builder pattern).
    #[must_use]
    pub fn with_aspect_value(mut self, value: impl Into<String>) -> Self {
        self.aspect = Some(Aspect::new(value));
        self
    }

    /// Decode an event from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MalformedEvent`] if the text is not a JSON object
    /// of the expected shape.
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let value: Value = serde_json::from_str(json).map_err(malformed_event)?;
        Self::from_value(value)
    }

    /// Decode an event from an already-parsed JSON value.
    ///
    /// The event and its `aspect` must be JSON objects. Arrays are rejected
    /// even though serde would read them as positional fields.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MalformedEvent`] if the value does not have the
    /// expected shape.
    pub fn from_value(value: Value) -> Result<Self, MatchError> {
        require_object("event", &value)?;
        if let Some(aspect) = value.get("aspect").filter(|a| !a.is_null()) {
            require_object("aspect", aspect)?;
        }
        serde_json::from_value(value).map_err(malformed_event)
    }

    /// Entity type, if present.
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// Aspect name, if present.
    #[must_use]
    pub fn aspect_name(&self) -> Option<&str> {
        self.aspect_name.as_deref()
    }

    /// Aspect value, if both the aspect and its value are present.
    #[must_use]
    pub fn aspect_value(&self) -> Option<&str> {
        self.aspect.as_ref().and_then(|a| a.value.as_deref())
    }
}

fn malformed_event(err: serde_json::Error) -> MatchError {
    MatchError::MalformedEvent {
        message: err.to_string(),
    }
}

fn require_object(what: &str, value: &Value) -> Result<(), MatchError> {
    let found = match value {
        Value::Object(_) => return Ok(()),
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
    };
    Err(MatchError::MalformedEvent {
        message: format!("{what} must be a JSON object, found {found}"),
    })
}

/// A named sub-payload attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aspect {
    /// JSON-encoded aspect body, with backslash-escaped characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Encoding of `value` as declared by the producer (usually `application/json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Inner payload shape; only `customProperties` is read.
#[derive(Deserialize)]
struct AspectPayload {
    #[serde(rename = "customProperties")]
    custom_properties: CustomProperties,
}

impl Aspect {
    /// Create an aspect with the given value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            content_type: None,
        }
    }

    /// Un-escape and decode the `customProperties` mapping from this aspect.
    ///
    /// Returns `Ok(None)` when the aspect carries no value.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MalformedPayload`] when the value is not valid
    /// JSON after un-escaping, or when `customProperties` is absent or is not
    /// an object of string values.
    pub fn custom_properties(&self, aspect_name: &str) -> Result<Option<CustomProperties>, MatchError> {
        let Some(value) = self.value.as_deref() else {
            return Ok(None);
        };

        let payload: AspectPayload = serde_json::from_str(&unescape_payload(value)).map_err(|e| {
            MatchError::MalformedPayload {
                aspect_name: aspect_name.to_owned(),
                message: e.to_string(),
            }
        })?;

        Ok(Some(payload.custom_properties))
    }
}

/// Strip backslash escapes from an aspect value.
///
/// Producers double-escape the embedded JSON; every backslash is removed,
/// which turns `{\"a\":\"b\"}` back into `{"a":"b"}`. A backslash that was
/// meant to be literal inside a property value is lost.
#[must_use]
pub fn unescape_payload(value: &str) -> String {
    value.replace('\\', "")
}
