// src/dag/mod.rs

//! DAG definition, validation and planning.
//!
//! - [`model`] holds the in-memory representation of a DAG file.
//! - [`loader`] reads and deserializes DAG YAML files.
//! - [`validate`] performs structural and semantic validation.
//! - [`planner`] converts a validated DAG into ordered execution waves.

pub mod loader;
pub mod model;
pub mod planner;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{DagDefinition, DagMeta, FeatureSpec, Layer};
pub use planner::ExecutionPlan;
pub use validate::{ValidationError, ValidationErrorKind, validate};
