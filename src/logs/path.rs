// src/logs/path.rs

//! Log file path resolution.
//!
//! Two on-disk layouts exist:
//!
//! - **Hierarchical**: `<log_base>/<log_file>`, where `log_base` is
//!   namespaced by DAG name and run id so different DAGs on one machine
//!   never collide. Used by every run created since the scheme exists.
//! - **Legacy flat**: `<state_dir>/logs/<spec_id>.log`, kept for runs
//!   persisted before `log_base`/`log_file` were recorded.

use std::path::{Path, PathBuf};

use crate::errors::{Result, SpecdagError};
use crate::run::state::DagRun;

/// Where a spec's log lives, as a tagged addressing strategy rather than
/// scattered conditionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLocation {
    Hierarchical { base: PathBuf, file: String },
    LegacyFlat { state_dir: PathBuf, spec_id: String },
}

impl LogLocation {
    pub fn resolve(&self) -> PathBuf {
        match self {
            LogLocation::Hierarchical { base, file } => base.join(file),
            LogLocation::LegacyFlat { state_dir, spec_id } => {
                state_dir.join("logs").join(format!("{spec_id}.log"))
            }
        }
    }
}

/// Determine the addressing strategy for a spec within a run.
///
/// Hierarchical addressing applies only when both the run's `log_base` and
/// the spec's `log_file` were populated; anything else falls back to the
/// legacy flat layout.
pub fn location_for(state_dir: &Path, run: &DagRun, spec_id: &str) -> Result<LogLocation> {
    let spec = run
        .specs
        .get(spec_id)
        .ok_or_else(|| SpecdagError::SpecNotFound(spec_id.to_string()))?;

    if !run.log_base.is_empty() && !spec.log_file.is_empty() {
        Ok(LogLocation::Hierarchical {
            base: PathBuf::from(&run.log_base),
            file: spec.log_file.clone(),
        })
    } else {
        Ok(LogLocation::LegacyFlat {
            state_dir: state_dir.to_path_buf(),
            spec_id: spec_id.to_string(),
        })
    }
}

/// Resolve the full log file path for a spec within a run.
pub fn resolve_log_path(state_dir: &Path, run: &DagRun, spec_id: &str) -> Result<PathBuf> {
    Ok(location_for(state_dir, run, spec_id)?.resolve())
}
