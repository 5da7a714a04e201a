//! Behavioural properties of the predicate chain, checked over small grids
//! of configurations and events.

use evmatch_test::prelude::*;
use std::sync::Arc;

fn compile(config: MatchConfig) -> Arc<MatchCriteria> {
    Arc::new(MatchCriteria::compile(&config).expect("valid config"))
}

const ENTITY_TYPES: [&str; 4] = ["dataset", "chart", "dashboard", "mlModel"];

fn sample_events() -> Vec<MetadataChangeEvent> {
    let mut events = vec![MetadataChangeEvent::new()];
    for entity_type in ENTITY_TYPES {
        events.push(MetadataChangeEvent::new().with_entity_type(entity_type));
        events.push(properties_event(entity_type, "ownership", &[("owner", "alice")]));
        events.push(escaped_properties_event(entity_type, "ownership", &[("tier", "")]));
    }
    events
}

#[test]
fn absent_or_empty_allow_list_accepts_every_event() {
    for config in [
        MatchConfig::new(),
        MatchConfig::new().with_entity_types(Vec::<String>::new()),
    ] {
        let predicate = EntityTypePredicate::new(compile(config));
        for event in sample_events() {
            assert_eq!(predicate.matches(&event).unwrap(), MatchResult::matched());
        }
    }
}

#[test]
fn unlisted_entity_type_is_rejected_without_data() {
    let predicate = EntityTypePredicate::new(compile(
        MatchConfig::new().with_entity_types(["dataset"]),
    ));
    for event in sample_events() {
        let result = predicate.matches(&event).unwrap();
        match event.entity_type() {
            Some("dataset") => assert!(result.is_match()),
            _ => assert_eq!(result, MatchResult::NoMatch),
        }
        assert_eq!(result.properties(), None);
    }
}

#[test]
fn without_expressions_prop_value_equals_entity_type() {
    for allow in [vec![], vec!["dataset"], vec!["chart", "dashboard"]] {
        let criteria = compile(MatchConfig::new().with_entity_types(allow));
        let entity = EntityTypePredicate::new(Arc::clone(&criteria));
        let props = PropValuePredicate::new(criteria, "ownership");

        for event in sample_events() {
            let result = props.matches(&event).unwrap();
            assert_eq!(result, entity.matches(&event).unwrap());
            assert_eq!(result.properties(), None);
        }
    }
}

#[test]
fn exact_expression_matches_iff_value_equal() {
    let values = ["alice", "Alice", "alice ", "", "bob"];
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["owner=alice"])),
        "ownership",
    );

    for value in values {
        let event = properties_event("dataset", "ownership", &[("owner", value)]);
        let result = predicate.matches(&event).unwrap();
        assert_eq!(result.is_match(), value == "alice", "value {value:?}");
    }

    let missing = properties_event("dataset", "ownership", &[("team", "alice")]);
    assert_eq!(predicate.matches(&missing).unwrap(), MatchResult::NoMatch);
}

#[test]
fn wildcard_matches_iff_present_and_non_empty() {
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["tier=*"])),
        "ownership",
    );

    for (pairs, expected) in [
        (vec![("tier", "gold")], true),
        (vec![("tier", " ")], true),
        (vec![("tier", "")], false),
        (vec![("team", "gold")], false),
        (vec![], false),
    ] {
        let event = properties_event("dataset", "ownership", &pairs);
        assert_eq!(
            predicate.matches(&event).unwrap().is_match(),
            expected,
            "pairs {pairs:?}"
        );
    }
}

#[test]
fn extracted_properties_are_the_whole_candidate_mapping() {
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["owner=alice"])),
        "ownership",
    );
    let pairs = [("owner", "alice"), ("team", "data"), ("tier", "")];
    let result = predicate
        .matches(&properties_event("dataset", "ownership", &pairs))
        .unwrap();
    assert_eq!(result.into_properties(), Some(properties(&pairs)));
}

#[test]
fn evaluation_is_idempotent() {
    let predicate = PropValuePredicate::new(
        compile(
            MatchConfig::new()
                .with_entity_types(["dataset", "chart"])
                .with_entity_props(["owner=alice"]),
        ),
        "ownership",
    );
    for event in sample_events() {
        let first = predicate.matches(&event).unwrap();
        let second = predicate.matches(&event).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn escaped_payload_decodes_like_canonical() {
    let pairs = [("owner", "alice"), ("tier", "gold"), ("note", "a=b")];
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["owner=alice", "note=a=b"])),
        "ownership",
    );

    let canonical = predicate
        .matches(&properties_event("dataset", "ownership", &pairs))
        .unwrap();
    let escaped = predicate
        .matches(&escaped_properties_event("dataset", "ownership", &pairs))
        .unwrap();

    assert!(canonical.is_match());
    assert_eq!(canonical, escaped);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn scenario_listed_entity_type() {
    let predicate = EntityTypePredicate::new(compile(MatchConfig::new().with_entity_types(["dataset"])));
    let event = MetadataChangeEvent::new().with_entity_type("dataset");
    assert_eq!(predicate.matches(&event).unwrap(), MatchResult::matched());
}

#[test]
fn scenario_unlisted_entity_type() {
    let predicate = EntityTypePredicate::new(compile(MatchConfig::new().with_entity_types(["dataset"])));
    let event = MetadataChangeEvent::new().with_entity_type("chart");
    assert_eq!(predicate.matches(&event).unwrap(), MatchResult::NoMatch);
}

#[test]
fn scenario_owner_matches() {
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["owner=alice"])),
        "ownership",
    );
    let event = properties_event("dataset", "ownership", &[("owner", "alice")]);
    assert_eq!(
        predicate.matches(&event).unwrap(),
        MatchResult::with_properties(properties(&[("owner", "alice")]))
    );
}

#[test]
fn scenario_owner_differs() {
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["owner=alice"])),
        "ownership",
    );
    let event = properties_event("dataset", "ownership", &[("owner", "bob")]);
    assert_eq!(predicate.matches(&event).unwrap(), MatchResult::NoMatch);
}

#[test]
fn scenario_wildcard_on_empty_value_is_rejected() {
    let predicate = PropValuePredicate::new(
        compile(MatchConfig::new().with_entity_props(["tier=*"])),
        "ownership",
    );
    let event = properties_event("dataset", "ownership", &[("tier", "")]);
    assert_eq!(predicate.matches(&event).unwrap(), MatchResult::NoMatch);
}
