// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Commands are an explicit enum matched by one dispatcher in `lib.rs`;
//! there is no hidden global command registry.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `specdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "specdag",
    version,
    about = "Drive per-feature AI-agent pipelines through a layered delivery DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding run state and legacy logs.
    #[arg(long, value_name = "DIR", default_value = ".specdag", global = true)]
    pub state_dir: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPECDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate a DAG file; exits non-zero when invalid.
    Validate {
        /// Path to the DAG YAML file.
        file: String,
    },

    /// Execute (or resume) a run of the DAG.
    Run {
        /// Path to the DAG YAML file.
        file: String,

        /// Print the execution plan without running anything.
        #[arg(long)]
        dry_run: bool,

        /// Maximum features executing concurrently within a wave
        /// (default: unbounded).
        #[arg(long, value_name = "N")]
        max_parallel: Option<usize>,

        /// Runner command invoked per feature with the feature id
        /// appended. Falls back to `SPECDAG_RUNNER`.
        #[arg(long, value_name = "CMD")]
        runner: Option<String>,
    },

    /// Show per-feature status for a run.
    Status {
        /// DAG file whose current run to show; omit for the most recent
        /// run across all workflows.
        file: Option<String>,

        /// Resolve the most recent run across all workflows.
        #[arg(long)]
        latest: bool,
    },

    /// Dump (or follow) the log of one feature within a run.
    Logs {
        /// Feature id whose log to read.
        spec_id: String,

        /// DAG file whose current run to read from; omit (or pass
        /// --latest) for the most recent run.
        file: Option<String>,

        /// Resolve the most recent run across all workflows.
        #[arg(long)]
        latest: bool,

        /// Keep following the log for new output until interrupted.
        #[arg(long)]
        follow: bool,
    },

    /// Follow a feature's log live; shorthand for `logs --follow`.
    Watch {
        /// Feature id whose log to follow.
        spec_id: String,

        /// DAG file whose current run to read from; omit for the most
        /// recent run.
        file: Option<String>,
    },

    /// Print a textual view of the DAG's layers and dependencies.
    Visualize {
        /// Path to the DAG YAML file.
        file: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_latest_flag() {
        let args = CliArgs::try_parse_from(["specdag", "status", "--latest"])
            .expect("status --latest should parse");
        match args.command {
            Command::Status { file, latest } => {
                assert!(latest);
                assert!(file.is_none());
            }
            other => panic!("expected status command, got {other:?}"),
        }
    }

    #[test]
    fn status_accepts_latest_alongside_a_file() {
        let args = CliArgs::try_parse_from(["specdag", "status", "demo.yaml", "--latest"])
            .expect("status <file> --latest should parse");
        match args.command {
            Command::Status { file, latest } => {
                assert!(latest);
                assert_eq!(file.as_deref(), Some("demo.yaml"));
            }
            other => panic!("expected status command, got {other:?}"),
        }
    }
}
