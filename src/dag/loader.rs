// src/dag/loader.rs

use std::fs;
use std::path::Path;

use crate::dag::model::DagDefinition;
use crate::dag::validate::validate;
use crate::errors::{Result, SpecdagError};

/// Load a DAG definition from a YAML file without semantic validation.
///
/// Use [`load_and_validate`] for the recommended entry point.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<DagDefinition> {
    let contents = fs::read_to_string(path.as_ref())?;
    let def: DagDefinition = serde_yaml::from_str(&contents)?;
    Ok(def)
}

/// Load a DAG definition and run full validation.
///
/// Returns [`SpecdagError::Validation`] carrying every problem found when
/// the definition is structurally or semantically invalid.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DagDefinition> {
    let def = load_from_path(path)?;
    let errors = validate(&def);
    if errors.is_empty() {
        Ok(def)
    } else {
        Err(SpecdagError::Validation(errors))
    }
}
