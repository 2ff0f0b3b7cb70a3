// src/run/mod.rs

//! Run execution: state model, persistence, per-feature execution and the
//! wave scheduler.
//!
//! - [`state`] defines [`DagRun`]/[`SpecState`] and run-id generation.
//! - [`store`] owns all persistence of run state (atomic writes, three
//!   resolution strategies).
//! - [`executor`] runs one feature's pipeline with log capture.
//! - [`scheduler`] orchestrates a full run: layer barriers, bounded
//!   concurrency, failure policy, resumability.

pub mod executor;
pub mod scheduler;
pub mod state;
pub mod store;

pub use executor::{AgentPipeline, ExecOutcome, FeaturePipeline, SpecResult, execute};
pub use scheduler::RunController;
pub use state::{DagRun, RunStatus, SpecState, SpecStatus, generate_run_id};
pub use store::RunStateStore;
