// src/dag/validate.rs

//! Structural and semantic validation of a parsed DAG definition.
//!
//! Validation is pure: it never touches run state, and it collects *all*
//! problems it can find rather than stopping at the first one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::model::{DagDefinition, SUPPORTED_SCHEMA_VERSIONS};

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    UnsupportedSchemaVersion,
    MissingLayers,
    EmptyLayer,
    DuplicateFeatureId,
    UnresolvedDependency,
    InvalidDependencyOrder,
    CycleDetected,
}

/// One validation failure, tied to the feature (or layer) it concerns.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Offending feature id, when the error concerns a specific feature.
    pub feature: Option<String>,
    pub message: String,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, feature: Option<&str>, message: String) -> Self {
        Self {
            kind,
            feature: feature.map(|s| s.to_string()),
            message,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.feature {
            Some(id) => write!(f, "{:?} [{}]: {}", self.kind, id, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Validate a DAG definition, returning every problem found.
///
/// An empty vector means the definition is valid. Checks run in a fixed
/// order: schema version, layer shape, id uniqueness, dependency
/// resolution, dependency layer ordering, and finally a defensive cycle
/// check over the full dependency graph.
pub fn validate(def: &DagDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_schema_version(def, &mut errors);
    check_layers(def, &mut errors);
    check_unique_ids(def, &mut errors);
    check_dependencies(def, &mut errors);
    check_cycles(def, &mut errors);

    errors
}

fn check_schema_version(def: &DagDefinition, errors: &mut Vec<ValidationError>) {
    if !SUPPORTED_SCHEMA_VERSIONS.contains(&def.schema_version.as_str()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnsupportedSchemaVersion,
            None,
            format!(
                "schema_version '{}' is not supported (supported: {:?})",
                def.schema_version, SUPPORTED_SCHEMA_VERSIONS
            ),
        ));
    }
}

fn check_layers(def: &DagDefinition, errors: &mut Vec<ValidationError>) {
    if def.layers.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingLayers,
            None,
            "DAG must declare at least one layer with at least one feature".to_string(),
        ));
        return;
    }

    for layer in &def.layers {
        if layer.features.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyLayer,
                None,
                format!("layer '{}' declares no features", layer.id),
            ));
        }
    }
}

fn check_unique_ids(def: &DagDefinition, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();

    for feature in def.features() {
        if !seen.insert(feature.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateFeatureId,
                Some(&feature.id),
                format!("feature id '{}' is declared more than once", feature.id),
            ));
        }
    }
}

fn check_dependencies(def: &DagDefinition, errors: &mut Vec<ValidationError>) {
    let layer_of: HashMap<&str, usize> = def.layer_index_by_feature();

    for (layer_idx, layer) in def.layers.iter().enumerate() {
        for feature in &layer.features {
            for dep in &feature.depends_on {
                match layer_of.get(dep.as_str()) {
                    None => {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::UnresolvedDependency,
                            Some(&feature.id),
                            format!(
                                "feature '{}' depends on unknown feature '{}'",
                                feature.id, dep
                            ),
                        ));
                    }
                    // A dependency in the same or a later layer can never be
                    // satisfied: cross-layer is the only allowed direction.
                    Some(&dep_layer) if dep_layer >= layer_idx => {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::InvalidDependencyOrder,
                            Some(&feature.id),
                            format!(
                                "feature '{}' (layer {}) depends on '{}' (layer {}); \
                                 dependencies must live in a strictly earlier layer",
                                feature.id, layer_idx, dep, dep_layer
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

/// Defensive cycle check over the full dependency graph.
///
/// Layer ordering already forbids cycles, but a malformed definition with
/// broken layer indexing could still encode one, so we toposort anyway.
fn check_cycles(def: &DagDefinition, errors: &mut Vec<ValidationError>) {
    let edges: Vec<(&str, &str)> = def
        .features()
        .flat_map(|f| {
            f.depends_on
                .iter()
                .map(move |dep| (dep.as_str(), f.id.as_str()))
        })
        .collect();
    let nodes: Vec<&str> = def.features().map(|f| f.id.as_str()).collect();

    if let Some(node) = find_cycle_node(&nodes, &edges) {
        errors.push(ValidationError::new(
            ValidationErrorKind::CycleDetected,
            Some(node),
            format!("cycle detected in dependency graph involving '{}'", node),
        ));
    }
}

/// Returns a node participating in a cycle, if one exists.
///
/// Edge direction: dependency -> dependent.
fn find_cycle_node<'a>(nodes: &[&'a str], edges: &[(&'a str, &'a str)]) -> Option<&'a str> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for node in nodes {
        graph.add_node(node);
    }
    for (from, to) in edges {
        graph.add_edge(from, to, ());
    }

    match toposort(&graph, None) {
        Ok(_order) => None,
        Err(cycle) => Some(cycle.node_id()),
    }
}
