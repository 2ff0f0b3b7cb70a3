// src/lib.rs

pub mod cli;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod logs;
pub mod run;
pub mod visualize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::dag::loader::{load_and_validate, load_from_path};
use crate::dag::planner::{ExecutionPlan, render_dry_run};
use crate::dag::validate::validate;
use crate::errors::{Result, SpecdagError};
use crate::logs::path::resolve_log_path;
use crate::logs::stream::stream_logs;
use crate::run::executor::AgentPipeline;
use crate::run::scheduler::RunController;
use crate::run::state::{DagRun, RunStatus};
use crate::run::store::RunStateStore;

/// Runner command used when neither `--runner` nor `SPECDAG_RUNNER` is set.
const DEFAULT_RUNNER: &str = "specdag-agent";

/// High-level entry point used by `main.rs`: dispatch one CLI command.
pub async fn run(args: CliArgs) -> Result<()> {
    let state_dir = PathBuf::from(&args.state_dir);

    match args.command {
        Command::Validate { file } => cmd_validate(&file),
        Command::Run {
            file,
            dry_run,
            max_parallel,
            runner,
        } => cmd_run(&state_dir, &file, dry_run, max_parallel, runner).await,
        Command::Status { file, latest } => {
            // --latest wins over an explicit file.
            let file = if latest { None } else { file };
            cmd_status(&state_dir, file.as_deref())
        }
        Command::Logs {
            spec_id,
            file,
            latest,
            follow,
        } => {
            // --latest wins over an explicit file.
            let file = if latest { None } else { file };
            cmd_logs(&state_dir, file.as_deref(), &spec_id, follow).await
        }
        Command::Watch { spec_id, file } => {
            cmd_logs(&state_dir, file.as_deref(), &spec_id, true).await
        }
        Command::Visualize { file } => cmd_visualize(&file),
    }
}

fn cmd_validate(file: &str) -> Result<()> {
    let def = load_from_path(file)?;
    let errors = validate(&def);

    if errors.is_empty() {
        println!("{file}: valid ({} feature(s) across {} layer(s))", def.feature_count(), def.layers.len());
        return Ok(());
    }

    for error in &errors {
        eprintln!("{error}");
    }
    Err(SpecdagError::Validation(errors))
}

async fn cmd_run(
    state_dir: &Path,
    file: &str,
    dry_run: bool,
    max_parallel: Option<usize>,
    runner: Option<String>,
) -> Result<()> {
    let def = load_and_validate(file)?;

    if dry_run {
        let plan = ExecutionPlan::from_definition(&def);
        print!("{}", render_dry_run(&def, &plan));
        return Ok(());
    }

    let runner_cmd = runner
        .or_else(|| std::env::var("SPECDAG_RUNNER").ok())
        .unwrap_or_else(|| DEFAULT_RUNNER.to_string());

    let store = RunStateStore::new(state_dir);
    let pipeline = Arc::new(AgentPipeline::new(runner_cmd));
    let controller = RunController::new(store, pipeline, max_parallel);

    // Ctrl-C -> cancellation signal for every in-flight feature.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        warn!("interrupt received; cancelling run");
        let _ = cancel_tx.send(true);
    });

    let run = controller.run(&def, Path::new(file), cancel_rx).await?;
    print_run_summary(&run);

    match run.status {
        RunStatus::Completed => Ok(()),
        RunStatus::Failed => Err(SpecdagError::Other(anyhow::anyhow!(
            "run '{}' failed; see `specdag status {}`",
            run.run_id,
            file
        ))),
        _ => {
            info!(run_id = %run.run_id, "run interrupted; re-run the same command to resume");
            Ok(())
        }
    }
}

fn cmd_status(state_dir: &Path, file: Option<&str>) -> Result<()> {
    let store = RunStateStore::new(state_dir);
    let run = resolve_run(&store, file)?;
    print_run_summary(&run);
    Ok(())
}

async fn cmd_logs(state_dir: &Path, file: Option<&str>, spec_id: &str, follow: bool) -> Result<()> {
    let store = RunStateStore::new(state_dir);
    let run = resolve_run(&store, file)?;
    let path = resolve_log_path(state_dir, &run, spec_id)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    if follow {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });
    }

    let mut stdout = std::io::stdout();
    stream_logs(&path, follow, cancel_rx, &mut stdout).await
}

fn cmd_visualize(file: &str) -> Result<()> {
    let def = load_and_validate(file)?;
    print!("{}", visualize::render(&def));
    Ok(())
}

/// Resolve a run: explicit file -> its current run, otherwise the most
/// recent run across all workflows.
fn resolve_run(store: &RunStateStore, file: Option<&str>) -> Result<DagRun> {
    match file {
        Some(file) => store.load_by_workflow(file),
        None => store.find_latest(),
    }
}

fn print_run_summary(run: &DagRun) {
    println!("run {}  [{:?}]", run.run_id, run.status);
    println!("  workflow: {}", run.workflow_path);
    println!("  started:  {}", run.started_at.to_rfc3339());
    if let Some(done) = run.completed_at {
        println!("  finished: {}", done.to_rfc3339());
    }

    println!();
    for (id, spec) in &run.specs {
        let mut line = format!("  {:<24} {:?}", id, spec.status);
        if let Some(msg) = &spec.error_message {
            line.push_str(&format!("  ({msg})"));
        }
        println!("{line}");
    }
}
