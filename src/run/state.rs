// src/run/state.rs

//! Durable record of one execution of a DAG.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::dag::model::DagDefinition;

/// Status of a run as a whole. Transitions are monotonic:
/// `Pending -> Running -> (Completed | Failed)`, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Status of one feature within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Per-feature state, scoped to one run. Created `Pending` when the run is
/// initialized and never deleted during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecState {
    pub spec_id: String,
    pub status: SpecStatus,
    /// Log filename relative to the run's `log_base`; empty under the
    /// legacy flat scheme.
    #[serde(default)]
    pub log_file: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// One execution attempt of a DAG, tracked independently of the DAG file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagRun {
    pub run_id: String,
    /// Path of the workflow (DAG) file this run was started from.
    pub workflow_path: String,
    /// File name component of the workflow path.
    pub dag_file: String,
    /// Root directory of the hierarchical log scheme; empty for runs
    /// created before that scheme existed (legacy flat layout).
    #[serde(default)]
    pub log_base: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// BTreeMap keeps the serialized state file deterministic.
    pub specs: BTreeMap<String, SpecState>,
}

impl DagRun {
    /// Initialize a fresh run for a DAG definition.
    ///
    /// All features are pre-populated as `Pending` with hierarchical log
    /// filenames (`<spec_id>.log`) under a `log_base` namespaced by DAG
    /// name and run id, so different DAGs sharing one state dir never
    /// collide.
    pub fn new(def: &DagDefinition, workflow_path: &Path, state_dir: &Path) -> Self {
        let run_id = generate_run_id();
        let log_base = state_dir.join("logs").join(&def.dag.name).join(&run_id);

        let mut specs = BTreeMap::new();
        for feature in def.features() {
            specs.insert(
                feature.id.clone(),
                SpecState {
                    spec_id: feature.id.clone(),
                    status: SpecStatus::Pending,
                    log_file: format!("{}.log", feature.id),
                    started_at: None,
                    completed_at: None,
                    error_message: None,
                },
            );
        }

        let dag_file = workflow_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            run_id,
            workflow_path: workflow_path.to_string_lossy().into_owned(),
            dag_file,
            log_base: log_base.to_string_lossy().into_owned(),
            status: RunStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            specs,
        }
    }

    /// Count of specs in a terminal state.
    pub fn terminal_spec_count(&self) -> usize {
        self.specs
            .values()
            .filter(|s| matches!(s.status, SpecStatus::Completed | SpecStatus::Failed))
            .count()
    }
}

/// Generate a sortable run id: `YYYYMMDD_HHMMSS_<rand8>`.
///
/// The timestamp prefix makes ids sort by start time; the random suffix
/// disambiguates runs started within the same second.
pub fn generate_run_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();

    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), suffix)
}
