//! Conformance tests that run YAML fixtures against evmatch
//!
//! Run with: cargo test -p evmatch-test --test conformance
//!
//! The `fixtures` feature is enabled for this crate's own tests through its
//! dev-dependency on itself.

use evmatch_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the fixtures directory at the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let ext_test = Path::new(manifest_dir);

    // Go up: ext/test -> ext -> workspace root
    let root = ext_test
        .parent() // ext
        .and_then(|p| p.parent()) // workspace root
        .expect("Could not find workspace root");

    root.join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_entity_type() {
    run_fixture_file("01_entity_type.yaml");
}

#[test]
fn test_prop_value() {
    run_fixture_file("02_prop_value.yaml");
}

#[test]
fn test_dispatch() {
    run_fixture_file("03_dispatch.yaml");
}

#[test]
fn test_errors() {
    run_fixture_file("04_errors.yaml");
}

#[test]
fn test_every_fixture_file_is_covered() {
    let mut names: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_yaml = path
                .extension()
                .is_some_and(|e| e == "yaml" || e == "yml");
            is_yaml.then(|| path.file_name()?.to_str().map(str::to_owned))?
        })
        .collect();
    names.sort();

    assert_eq!(
        names,
        [
            "01_entity_type.yaml",
            "02_prop_value.yaml",
            "03_dispatch.yaml",
            "04_errors.yaml",
        ]
    );
}
