// src/run/store.rs

//! Durable persistence of [`DagRun`] state.
//!
//! Layout under the state directory:
//!
//! ```text
//! <state_dir>/runs/<run_id>.yaml        one file per historical run
//! <state_dir>/workflows/<key>.yaml      current run pointer per workflow
//! ```
//!
//! Every write goes through a temp-file-then-rename so that a crash
//! mid-write never corrupts previously persisted state. This store is the
//! only component allowed to write run state to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, SpecdagError};
use crate::run::state::DagRun;

#[derive(Debug, Clone)]
pub struct RunStateStore {
    state_dir: PathBuf,
}

impl RunStateStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Persist the run under its run id (historical record).
    pub fn save(&self, run: &DagRun) -> Result<()> {
        let path = self.run_path(&run.run_id);
        write_atomic(&path, run)
    }

    /// Persist the run as the current run for its workflow file.
    pub fn save_by_workflow(&self, run: &DagRun) -> Result<()> {
        let path = self.workflow_path_for(&run.workflow_path);
        write_atomic(&path, run)
    }

    /// Persist under both addressing conventions.
    ///
    /// The scheduler routes every state transition through this call, so a
    /// failure here must abort the run.
    pub fn persist(&self, run: &DagRun) -> Result<()> {
        self.save(run)?;
        self.save_by_workflow(run)?;
        Ok(())
    }

    /// Load the current run recorded for a workflow file.
    pub fn load_by_workflow(&self, workflow: impl AsRef<Path>) -> Result<DagRun> {
        let workflow = workflow.as_ref();
        let path = self.workflow_path_for(workflow);

        if !path.exists() {
            return Err(SpecdagError::RunNotFoundForWorkflow(
                workflow.to_string_lossy().into_owned(),
            ));
        }
        read_run(&path)
    }

    /// Load a historical run by its id.
    pub fn load_by_run_id(&self, run_id: &str) -> Result<DagRun> {
        let path = self.run_path(run_id);

        if !path.exists() {
            return Err(SpecdagError::RunNotFound(run_id.to_string()));
        }
        read_run(&path)
    }

    /// Find the run with the most recent `started_at` across all persisted
    /// runs, irrespective of status.
    pub fn find_latest(&self) -> Result<DagRun> {
        let runs_dir = self.state_dir.join("runs");
        let mut latest: Option<DagRun> = None;

        let entries = match fs::read_dir(&runs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpecdagError::NoRunsExist(
                    self.state_dir.to_string_lossy().into_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }

            let run = read_run(&path)?;
            let newer = match &latest {
                Some(best) => run.started_at > best.started_at,
                None => true,
            };
            if newer {
                latest = Some(run);
            }
        }

        latest.ok_or_else(|| {
            SpecdagError::NoRunsExist(self.state_dir.to_string_lossy().into_owned())
        })
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.state_dir.join("runs").join(format!("{run_id}.yaml"))
    }

    fn workflow_path_for(&self, workflow: impl AsRef<Path>) -> PathBuf {
        let key = workflow_key(workflow.as_ref());
        self.state_dir.join("workflows").join(format!("{key}.yaml"))
    }
}

/// Stable filesystem key for a workflow file path.
///
/// Uses the file stem with non-alphanumeric characters flattened so that
/// e.g. `flows/checkout.dag.yaml` and `./flows/checkout.dag.yaml` map to
/// the same current-state file.
fn workflow_key(workflow: &Path) -> String {
    let stem = workflow
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workflow".to_string());

    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn write_atomic(path: &Path, run: &DagRun) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| SpecdagError::Other(anyhow::anyhow!("state path has no parent")))?;
    fs::create_dir_all(dir)?;

    let serialized = serde_yaml::to_string(run)?;
    let tmp = path.with_extension("yaml.tmp");

    fs::write(&tmp, serialized)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), run_id = %run.run_id, "run state persisted");
    Ok(())
}

fn read_run(path: &Path) -> Result<DagRun> {
    let contents = fs::read_to_string(path)?;
    let run: DagRun = serde_yaml::from_str(&contents)?;
    Ok(run)
}
