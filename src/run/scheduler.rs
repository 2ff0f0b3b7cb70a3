// src/run/scheduler.rs

//! Run controller: drives a full DAG run across planner, executor and
//! state store.
//!
//! Waves execute strictly in declared layer order; within a wave features
//! run concurrently with no ordering between them (they are
//! dependency-independent by construction, since cross-layer is the only
//! allowed dependency direction). All `DagRun` mutation happens in this
//! controller task: worker tasks only run pipelines and report back, which
//! keeps the specs map single-writer without a lock.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::dag::model::DagDefinition;
use crate::dag::planner::ExecutionPlan;
use crate::errors::Result;
use crate::logs::path::resolve_log_path;
use crate::run::executor::{ExecOutcome, FeaturePipeline, execute};
use crate::run::state::{DagRun, RunStatus, SpecStatus};
use crate::run::store::RunStateStore;

pub struct RunController<P: FeaturePipeline> {
    store: RunStateStore,
    pipeline: Arc<P>,
    /// Upper bound on concurrently executing features within a wave.
    /// `None` means unbounded; layers are expected to be small.
    max_parallel: Option<usize>,
}

impl<P: FeaturePipeline> RunController<P> {
    pub fn new(store: RunStateStore, pipeline: Arc<P>, max_parallel: Option<usize>) -> Self {
        Self {
            store,
            pipeline,
            max_parallel,
        }
    }

    /// Entry point for `specdag run`: resolve or create a run for the
    /// workflow file, then drive it to a terminal state (or until
    /// cancelled).
    pub async fn run(
        &self,
        def: &DagDefinition,
        workflow_path: &Path,
        cancel: watch::Receiver<bool>,
    ) -> Result<DagRun> {
        let run = self.resolve_or_create(def, workflow_path)?;
        self.run_existing(run, def, cancel).await
    }

    /// Resume an existing non-terminal by-workflow run, or start a fresh
    /// one (also when the recorded run already finished).
    fn resolve_or_create(&self, def: &DagDefinition, workflow_path: &Path) -> Result<DagRun> {
        match self.store.load_by_workflow(workflow_path) {
            Ok(run) if !run.status.is_terminal() => {
                info!(
                    run_id = %run.run_id,
                    done = run.terminal_spec_count(),
                    total = run.specs.len(),
                    "resuming existing run"
                );
                Ok(run)
            }
            Ok(finished) => {
                debug!(
                    run_id = %finished.run_id,
                    status = ?finished.status,
                    "previous run is terminal; starting a new run"
                );
                Ok(self.new_run(def, workflow_path))
            }
            Err(crate::errors::SpecdagError::RunNotFoundForWorkflow(_)) => {
                Ok(self.new_run(def, workflow_path))
            }
            Err(e) => Err(e),
        }
    }

    fn new_run(&self, def: &DagDefinition, workflow_path: &Path) -> DagRun {
        let run = DagRun::new(def, workflow_path, self.store.state_dir());
        info!(run_id = %run.run_id, dag = %def.dag.name, "created new run");
        run
    }

    /// Drive a concrete run to completion.
    ///
    /// Handing this a run whose specs are all terminal dispatches nothing;
    /// a fully completed run is reported back as `Completed` immediately
    /// (resume idempotence).
    pub async fn run_existing(
        &self,
        mut run: DagRun,
        def: &DagDefinition,
        cancel: watch::Receiver<bool>,
    ) -> Result<DagRun> {
        if run.status.is_terminal() {
            info!(run_id = %run.run_id, status = ?run.status, "run already terminal; nothing to do");
            return Ok(run);
        }

        let plan = ExecutionPlan::from_definition(def);

        run.status = RunStatus::Running;
        self.store.persist(&run)?;

        for (wave_idx, wave) in plan.waves.iter().enumerate() {
            // `Running` found at dispatch time means a prior crash left it
            // in flight; it cannot have truly completed, so re-dispatch.
            let ready: Vec<String> = wave
                .iter()
                .filter(|id| {
                    matches!(
                        run.specs.get(id.as_str()).map(|s| s.status),
                        Some(SpecStatus::Pending) | Some(SpecStatus::Running)
                    )
                })
                .cloned()
                .collect();

            if ready.is_empty() {
                debug!(run_id = %run.run_id, wave = wave_idx + 1, "wave has nothing to dispatch");
            } else {
                info!(
                    run_id = %run.run_id,
                    wave = wave_idx + 1,
                    features = ?ready,
                    "dispatching wave"
                );

                // Record in-flight work before anything starts, so a crash
                // mid-wave leaves an accurate picture for resume.
                for id in &ready {
                    if let Some(spec) = run.specs.get_mut(id.as_str()) {
                        spec.status = SpecStatus::Running;
                        spec.started_at = Some(Utc::now());
                    }
                }
                self.store.persist(&run)?;

                let interrupted = self.execute_wave(&mut run, &ready, cancel.clone()).await?;

                if interrupted {
                    info!(
                        run_id = %run.run_id,
                        wave = wave_idx + 1,
                        "run cancelled mid-wave; state left as persisted for resume"
                    );
                    return Ok(run);
                }
            }

            // Failure policy: siblings in the wave were allowed to finish;
            // the run halts at the wave boundary. Checked over the whole
            // wave, not just what was dispatched now: a crash can land
            // between persisting a spec's Failed state and persisting the
            // run's Failed status, and a resume must still honour it.
            let wave_failed = wave
                .iter()
                .any(|id| run.specs.get(id.as_str()).map(|s| s.status) == Some(SpecStatus::Failed));

            if wave_failed {
                warn!(run_id = %run.run_id, wave = wave_idx + 1, "wave contained failures; halting run");
                run.status = RunStatus::Failed;
                run.completed_at = Some(Utc::now());
                self.store.persist(&run)?;
                return Ok(run);
            }
        }

        run.status = RunStatus::Completed;
        run.completed_at = Some(Utc::now());
        self.store.persist(&run)?;

        info!(run_id = %run.run_id, "run completed");
        Ok(run)
    }

    /// Dispatch one wave concurrently and fold results back into the run.
    ///
    /// Each terminal result is persisted immediately, not batched, so
    /// state durability has single-feature granularity even inside a
    /// parallel wave. Returns `true` if cancellation interrupted the wave.
    async fn execute_wave(
        &self,
        run: &mut DagRun,
        ready: &[String],
        cancel: watch::Receiver<bool>,
    ) -> Result<bool> {
        let limiter = self
            .max_parallel
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut tasks: JoinSet<(String, ExecOutcome)> = JoinSet::new();

        for id in ready {
            let log_path = resolve_log_path(self.store.state_dir(), run, id)?;
            let pipeline = Arc::clone(&self.pipeline);
            let cancel = cancel.clone();
            let limiter = limiter.clone();
            let spec_id = id.clone();

            tasks.spawn(async move {
                // Semaphore is never closed, so acquisition only fails if
                // the limiter was dropped; run unthrottled in that case.
                let _permit = match &limiter {
                    Some(sem) => sem.clone().acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = execute(pipeline.as_ref(), &spec_id, &log_path, cancel).await;
                (spec_id, outcome)
            });
        }

        let mut interrupted = false;

        while let Some(joined) = tasks.join_next().await {
            let (spec_id, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "feature task panicked; marking run interrupted");
                    interrupted = true;
                    continue;
                }
            };

            match outcome {
                ExecOutcome::Finished(result) => {
                    match run.specs.get_mut(&spec_id) {
                        Some(spec) => {
                            spec.status = result.status;
                            spec.completed_at = Some(Utc::now());
                            spec.error_message = result.error_message;
                            debug!(spec = %spec_id, status = ?spec.status, "feature reached terminal state");
                        }
                        // Should not happen: dispatched ids come from the
                        // specs map. Be defensive rather than panic.
                        None => warn!(spec = %spec_id, "completion for spec missing from run"),
                    }
                    self.store.persist(run)?;
                }
                ExecOutcome::Cancelled => {
                    // Leave the spec at its last persisted status
                    // (`Running`); resume treats it as re-dispatchable.
                    interrupted = true;
                }
            }
        }

        Ok(interrupted)
    }
}
