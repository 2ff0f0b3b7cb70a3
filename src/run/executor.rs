// src/run/executor.rs

//! Execution of one feature's pipeline.
//!
//! The per-feature specify/plan/tasks/implement pipeline itself lives
//! behind the [`FeaturePipeline`] trait. Production code uses
//! [`AgentPipeline`], which shells out to an external runner command;
//! tests substitute a fake that completes instantly.

use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::run::state::SpecStatus;

/// Terminal result of one feature execution.
#[derive(Debug, Clone)]
pub struct SpecResult {
    pub status: SpecStatus,
    pub error_message: Option<String>,
}

impl SpecResult {
    pub fn completed() -> Self {
        Self {
            status: SpecStatus::Completed,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SpecStatus::Failed,
            error_message: Some(message.into()),
        }
    }
}

/// What became of a dispatched execution.
#[derive(Debug)]
pub enum ExecOutcome {
    /// The pipeline ran to a terminal result.
    Finished(SpecResult),
    /// Cancellation fired before the pipeline finished. The spec keeps
    /// whatever status was last persisted so a later resume re-runs it.
    Cancelled,
}

/// Trait abstracting the per-feature pipeline collaborator.
///
/// Implementations receive the open log file and must route all pipeline
/// output into it. The call may be long-running and blocking from the
/// orchestrator's point of view.
pub trait FeaturePipeline: Send + Sync + 'static {
    fn run_feature(
        &self,
        spec_id: &str,
        log_file: File,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
}

/// Production pipeline: spawns an external agent runner process.
///
/// The runner is invoked through the platform shell with the feature id
/// appended, stdout and stderr redirected into the log file.
pub struct AgentPipeline {
    runner_cmd: String,
}

impl AgentPipeline {
    pub fn new(runner_cmd: impl Into<String>) -> Self {
        Self {
            runner_cmd: runner_cmd.into(),
        }
    }
}

impl FeaturePipeline for AgentPipeline {
    fn run_feature(
        &self,
        spec_id: &str,
        log_file: File,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        let runner_cmd = self.runner_cmd.clone();
        let spec_id = spec_id.to_string();

        Box::pin(async move {
            let shell_cmd = format!("{runner_cmd} {spec_id}");
            info!(spec = %spec_id, cmd = %shell_cmd, "starting feature pipeline process");

            let stderr_file = log_file
                .try_clone()
                .with_context(|| format!("cloning log handle for spec '{spec_id}'"))?;

            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&shell_cmd);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&shell_cmd);
                c
            };

            cmd.stdout(Stdio::from(log_file))
                .stderr(Stdio::from(stderr_file))
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning pipeline process for spec '{spec_id}'"))?;

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for pipeline process of spec '{spec_id}'"))?;

            let code = status.code().unwrap_or(-1);
            info!(
                spec = %spec_id,
                exit_code = code,
                success = status.success(),
                "feature pipeline process exited"
            );

            if status.success() {
                Ok(())
            } else {
                anyhow::bail!("pipeline exited with code {code}")
            }
        })
    }
}

/// Run one feature's pipeline with output captured to `log_path`.
///
/// The log file is created (parent directories included) and truncated so
/// a re-run starts from a fresh log. Resume policy is not decided here;
/// the scheduler chooses what to dispatch.
pub async fn execute<P: FeaturePipeline + ?Sized>(
    pipeline: &P,
    spec_id: &str,
    log_path: &Path,
    mut cancel: watch::Receiver<bool>,
) -> ExecOutcome {
    let log_file = match open_log_file(log_path) {
        Ok(f) => f,
        Err(e) => {
            warn!(spec = %spec_id, error = %e, "failed to open log file");
            return ExecOutcome::Finished(SpecResult::failed(format!(
                "failed to open log file '{}': {e}",
                log_path.display()
            )));
        }
    };

    let pipeline_fut = pipeline.run_feature(spec_id, log_file);

    tokio::select! {
        result = pipeline_fut => match result {
            Ok(()) => {
                debug!(spec = %spec_id, "feature pipeline completed");
                ExecOutcome::Finished(SpecResult::completed())
            }
            Err(e) => {
                warn!(spec = %spec_id, error = %e, "feature pipeline failed");
                ExecOutcome::Finished(SpecResult::failed(e.to_string()))
            }
        },
        _ = cancel.changed() => {
            info!(spec = %spec_id, "cancellation requested; abandoning in-flight feature");
            ExecOutcome::Cancelled
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}
