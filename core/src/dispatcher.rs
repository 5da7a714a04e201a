//! Dispatcher — Select predicate chains by match type, first-match-wins
//!
//! A [`Dispatcher`] holds every candidate chain for one notification entry.
//! Only chains whose [`matches_type()`](crate::EventPredicate::matches_type)
//! is `true` are consulted, in order; the first that matches decides.

use crate::{
    CustomProperties, EventPredicate, MatchCriteria, MatchError, MatchResult,
    MetadataChangeEvent, NotificationConfig, PredicateTrace,
};
use serde::Serialize;
use std::sync::Arc;

/// A successful dispatch: which chain matched and what it extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    /// Match type of the chain that matched.
    pub match_type: Option<String>,
    /// Properties the chain extracted, if it ran property checks.
    pub properties: Option<CustomProperties>,
}

/// Trace of a full [`Dispatcher`] evaluation.
///
/// # INV: `result` == `evaluate()` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchTrace {
    /// The final result (identical to what `evaluate()` returns).
    pub result: Option<Dispatch>,
    /// Trace of each applicable chain that was evaluated, in order.
    /// Stops after the first match.
    pub chains: Vec<ChainTrace>,
    /// Number of chains skipped because their match type did not apply.
    pub skipped: usize,
}

/// One chain's evaluation in a [`DispatchTrace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTrace {
    /// Index of the chain in the dispatcher (0-based).
    pub index: usize,
    /// Match type the chain is bound to.
    pub match_type: Option<String>,
    /// The chain's predicate trace.
    pub trace: PredicateTrace,
}

/// Selects and evaluates predicate chains.
///
/// # INV: First-match-wins
///
/// Applicable chains are evaluated in order. The first match terminates
/// evaluation, even if later chains would also match. A data error from any
/// chain stops evaluation and propagates.
///
/// # Example
///
/// ```
/// use evmatch::prelude::*;
///
/// let config: NotificationConfig = serde_json::from_str(r#"{
///     "matchType": "properties",
///     "entityProps": ["tier=gold"],
///     "chains": [
///         {"matchType": "entity"},
///         {"matchType": "properties", "aspectName": "datasetProperties"}
///     ]
/// }"#).unwrap();
/// let dispatcher = Dispatcher::from_config(&config).unwrap();
///
/// let event = MetadataChangeEvent::new()
///     .with_aspect_name("datasetProperties")
///     .with_aspect_value(r#"{"customProperties":{"tier":"gold"}}"#);
/// let dispatch = dispatcher.evaluate(&event).unwrap().unwrap();
/// assert_eq!(dispatch.match_type.as_deref(), Some("properties"));
/// ```
#[derive(Debug, Default)]
pub struct Dispatcher {
    chains: Vec<Box<dyn EventPredicate>>,
}

impl Dispatcher {
    /// Create a dispatcher over the given chains.
    #[must_use]
    pub fn new(chains: Vec<Box<dyn EventPredicate>>) -> Self {
        Self { chains }
    }

    /// Compile a notification config into a dispatcher.
    ///
    /// All chains share one compiled [`MatchCriteria`].
    ///
    /// # Errors
    ///
    /// Returns any criteria compilation error, or [`MatchError::InvalidConfig`]
    /// if no chains are configured.
    pub fn from_config(config: &NotificationConfig) -> Result<Self, MatchError> {
        if config.chains.is_empty() {
            return Err(MatchError::InvalidConfig {
                message: "no predicate chains configured".into(),
            });
        }

        let criteria = Arc::new(MatchCriteria::compile(&config.criteria)?);
        let chains = config.chains.iter().map(|c| c.build(&criteria)).collect();
        Ok(Self::new(chains))
    }

    /// Number of chains, applicable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if there are no chains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Chains whose match type applies, in evaluation order.
    pub fn applicable(&self) -> impl Iterator<Item = &dyn EventPredicate> + '_ {
        self.chains
            .iter()
            .filter(|c| c.matches_type())
            .map(|c| -> &dyn EventPredicate { &**c })
    }

    /// Evaluate applicable chains against the event.
    ///
    /// Returns `Ok(None)` when no applicable chain matches.
    ///
    /// # Errors
    ///
    /// Propagates the first data error raised by a chain.
    pub fn evaluate(&self, event: &MetadataChangeEvent) -> Result<Option<Dispatch>, MatchError> {
        for chain in self.applicable() {
            if let MatchResult::Match { properties } = chain.matches(event)? {
                return Ok(Some(Dispatch {
                    match_type: chain.match_type().map(str::to_owned),
                    properties,
                }));
            }
        }
        Ok(None)
    }

    /// Evaluate with full trace for debugging.
    ///
    /// The trace records every applicable chain consulted up to and including
    /// the first match. `result` carries the same decision as
    /// [`evaluate()`](Self::evaluate); on a match it re-runs that chain's
    /// `matches` to obtain the extracted properties.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate()`](Self::evaluate).
    pub fn evaluate_with_trace(&self, event: &MetadataChangeEvent) -> Result<DispatchTrace, MatchError> {
        let mut chains = Vec::new();
        let mut skipped = 0;
        let mut result = None;

        for (index, chain) in self.chains.iter().enumerate() {
            if !chain.matches_type() {
                skipped += 1;
                continue;
            }

            let trace = chain.matches_with_trace(event)?;
            let matched = trace.matched;
            chains.push(ChainTrace {
                index,
                match_type: chain.match_type().map(str::to_owned),
                trace,
            });

            if matched {
                result = Some(Dispatch {
                    match_type: chain.match_type().map(str::to_owned),
                    properties: chain.matches(event)?.into_properties(),
                });
                // Chains after the first match are neither evaluated nor skipped.
                break;
            }
        }

        Ok(DispatchTrace {
            result,
            chains,
            skipped,
        })
    }
}
