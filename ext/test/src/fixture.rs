//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the evmatch engine:
//! YAML → `NotificationConfig` → `Dispatcher::from_config()` → evaluate.

use evmatch::prelude::*;
use serde::Deserialize;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub config: NotificationConfig,
    /// Expected config error kind; when set, `cases` are not run.
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// Raw event, decoded through `MetadataChangeEvent::from_value`.
    pub event: serde_json::Value,
    pub expect: Expectation,
}

/// What a case should produce.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub properties: Option<CustomProperties>,
    /// Expected data error kind (see [`error_kind`]).
    #[serde(default)]
    pub error: Option<String>,
}

/// Observable result of evaluating one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoMatch,
    Matched(Dispatch),
    Error(String),
}

impl Expectation {
    fn outcome(&self) -> Outcome {
        if let Some(kind) = &self.error {
            return Outcome::Error(kind.clone());
        }
        if self.matched {
            Outcome::Matched(Dispatch {
                match_type: self.match_type.clone(),
                properties: self.properties.clone(),
            })
        } else {
            Outcome::NoMatch
        }
    }
}

/// Stable snake_case name for a [`MatchError`] variant.
#[must_use]
pub fn error_kind(err: &MatchError) -> &'static str {
    match err {
        MatchError::MalformedExpression { .. } => "malformed_expression",
        MatchError::TooManyExpressions { .. } => "too_many_expressions",
        MatchError::TooManyEntityTypes { .. } => "too_many_entity_types",
        MatchError::ExpressionTooLong { .. } => "expression_too_long",
        MatchError::InvalidConfig { .. } => "invalid_config",
        MatchError::MalformedEvent { .. } => "malformed_event",
        MatchError::MalformedPayload { .. } => "malformed_payload",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Outcome,
    pub actual: Outcome,
}

impl TestCase {
    /// Decode and evaluate this case's event.
    pub fn evaluate(&self, dispatcher: &Dispatcher) -> Outcome {
        let result = MetadataChangeEvent::from_value(self.event.clone())
            .and_then(|event| dispatcher.evaluate(&event));
        match result {
            Ok(Some(dispatch)) => Outcome::Matched(dispatch),
            Ok(None) => Outcome::NoMatch,
            Err(e) => Outcome::Error(error_kind(&e).to_owned()),
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results.
    ///
    /// # Errors
    ///
    /// Returns the config error if the dispatcher fails to compile.
    pub fn run(&self) -> Result<Vec<CaseResult>, MatchError> {
        let dispatcher = Dispatcher::from_config(&self.config)?;
        Ok(self
            .cases
            .iter()
            .map(|case| {
                let expected = case.expect.outcome();
                let actual = case.evaluate(&dispatcher);
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == expected,
                    expected,
                    actual,
                }
            })
            .collect())
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        if let Some(kind) = &self.expect_error {
            match Dispatcher::from_config(&self.config) {
                Ok(_) => panic!("Fixture '{}' expected config error '{kind}', got Ok", self.name),
                Err(e) => assert_eq!(
                    error_kind(&e),
                    kind.as_str(),
                    "Fixture '{}' config error mismatch: {e}",
                    self.name
                ),
            }
            return;
        }

        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' config failed: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: inline
config:
  matchType: entity
  entityTypes: [dataset]
  chains:
    - matchType: entity
cases:
  - name: dataset
    event: {entityType: dataset}
    expect: {matched: true, matchType: entity}
  - name: chart
    event: {entityType: chart}
    expect: {matched: false}
"#;

    #[test]
    fn parses_and_runs_inline_fixture() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.cases.len(), 2);
        let results = fixture.run().unwrap();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
        fixture.run_and_assert();
    }

    #[test]
    fn expectation_error_wins_over_matched() {
        let expect = Expectation {
            matched: true,
            error: Some("malformed_payload".into()),
            ..Expectation::default()
        };
        assert_eq!(expect.outcome(), Outcome::Error("malformed_payload".into()));
    }

    #[test]
    fn error_kind_names_data_errors() {
        let err = MatchError::MalformedEvent {
            message: "x".into(),
        };
        assert_eq!(error_kind(&err), "malformed_event");
    }
}
