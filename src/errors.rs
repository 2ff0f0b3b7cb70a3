// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

use crate::dag::validate::ValidationError;

#[derive(Error, Debug)]
pub enum SpecdagError {
    #[error("DAG validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No run found with id '{0}'")]
    RunNotFound(String),

    #[error("No run found for workflow '{0}'")]
    RunNotFoundForWorkflow(String),

    #[error("No runs exist in state directory '{0}'")]
    NoRunsExist(String),

    #[error("Spec '{0}' is not part of this run")]
    SpecNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SpecdagError>;
