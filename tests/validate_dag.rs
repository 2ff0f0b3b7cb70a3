// tests/validate_dag.rs

use specdag::dag::loader::load_and_validate;
use specdag::dag::validate::{ValidationErrorKind, validate};
use specdag::errors::SpecdagError;
use specdag_test_utils::builders::{DagBuilder, feature, feature_with_deps};

fn kinds(errors: &[specdag::dag::validate::ValidationError]) -> Vec<ValidationErrorKind> {
    errors.iter().map(|e| e.kind).collect()
}

#[test]
fn valid_two_layer_dag_passes() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("a"), feature("b")])
        .layer("l2", vec![feature_with_deps("c", &["a", "b"])])
        .build();

    assert!(validate(&def).is_empty());
}

#[test]
fn zero_layers_is_missing_layers() {
    let def = DagBuilder::new("empty").build();
    let errors = validate(&def);
    assert!(kinds(&errors).contains(&ValidationErrorKind::MissingLayers));
}

#[test]
fn layer_without_features_is_rejected() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("a")])
        .layer("l2", vec![])
        .build();

    let errors = validate(&def);
    assert!(kinds(&errors).contains(&ValidationErrorKind::EmptyLayer));
}

#[test]
fn duplicate_feature_id_is_reported_with_offender() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("a")])
        .layer("l2", vec![feature("a")])
        .build();

    let errors = validate(&def);
    let dup = errors
        .iter()
        .find(|e| e.kind == ValidationErrorKind::DuplicateFeatureId)
        .expect("duplicate id error");
    assert_eq!(dup.feature.as_deref(), Some("a"));
}

#[test]
fn unknown_dependency_is_unresolved() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("a")])
        .layer("l2", vec![feature_with_deps("b", &["ghost"])])
        .build();

    let errors = validate(&def);
    let err = errors
        .iter()
        .find(|e| e.kind == ValidationErrorKind::UnresolvedDependency)
        .expect("unresolved dependency error");
    assert_eq!(err.feature.as_deref(), Some("b"));
    assert!(err.message.contains("ghost"));
}

#[test]
fn same_layer_dependency_is_invalid_order() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("a"), feature_with_deps("b", &["a"])])
        .build();

    let errors = validate(&def);
    let err = errors
        .iter()
        .find(|e| e.kind == ValidationErrorKind::InvalidDependencyOrder)
        .expect("dependency order error");
    assert_eq!(err.feature.as_deref(), Some("b"));
}

#[test]
fn forward_dependency_is_invalid_order() {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature_with_deps("a", &["b"])])
        .layer("l2", vec![feature("b")])
        .build();

    let errors = validate(&def);
    let err = errors
        .iter()
        .find(|e| e.kind == ValidationErrorKind::InvalidDependencyOrder)
        .expect("dependency order error");
    assert_eq!(err.feature.as_deref(), Some("a"));
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let def = DagBuilder::new("demo")
        .schema_version("99")
        .layer("l1", vec![feature("a")])
        .build();

    let errors = validate(&def);
    assert!(kinds(&errors).contains(&ValidationErrorKind::UnsupportedSchemaVersion));
}

#[test]
fn loader_parses_yaml_and_validates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.yaml");

    std::fs::write(
        &path,
        r#"
schema_version: "1"
dag:
  name: demo
  description: two waves
layers:
  - id: l1
    name: Foundations
    features:
      - id: a
        description: first
      - id: b
        description: second
  - id: l2
    name: Integration
    features:
      - id: c
        description: third
        depends_on: [a, b]
"#,
    )?;

    let def = load_and_validate(&path)?;
    assert_eq!(def.dag.name, "demo");
    assert_eq!(def.feature_count(), 3);
    Ok(())
}

#[test]
fn loader_surfaces_validation_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.yaml");

    std::fs::write(
        &path,
        r#"
schema_version: "1"
dag:
  name: bad
layers:
  - id: l1
    features:
      - id: a
        depends_on: [a]
"#,
    )?;

    match load_and_validate(&path) {
        Err(SpecdagError::Validation(errors)) => {
            assert!(!errors.is_empty());
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    Ok(())
}
