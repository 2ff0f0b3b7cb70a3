//! A fake [`FeaturePipeline`] that never spawns real processes.
//!
//! It records start/finish events for barrier assertions, writes a line of
//! output to the log file, and can be configured to fail or delay specific
//! features.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use specdag::run::executor::FeaturePipeline;

/// Observable lifecycle event of one fake execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Started(String),
    Finished(String),
}

pub struct FakePipeline {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
        }
    }

    /// Make the given feature's pipeline fail.
    pub fn failing(mut self, spec_id: &str) -> Self {
        self.failing.insert(spec_id.to_string());
        self
    }

    /// Delay every execution by `delay` before finishing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Delay one specific feature's execution.
    pub fn with_spec_delay(mut self, spec_id: &str, delay: Duration) -> Self {
        self.delays.insert(spec_id.to_string(), delay);
        self
    }

    /// All recorded events, in occurrence order.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of features that started executing, in start order.
    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::Started(id) => Some(id),
                PipelineEvent::Finished(_) => None,
            })
            .collect()
    }
}

impl Default for FakePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FeaturePipeline for FakePipeline {
    fn run_feature(
        &self,
        spec_id: &str,
        mut log_file: File,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        let events = Arc::clone(&self.events);
        let fail = self.failing.contains(spec_id);
        let delay = self
            .delays
            .get(spec_id)
            .copied()
            .unwrap_or(self.default_delay);
        let spec_id = spec_id.to_string();

        Box::pin(async move {
            events
                .lock()
                .unwrap()
                .push(PipelineEvent::Started(spec_id.clone()));

            writeln!(log_file, "fake pipeline output for {spec_id}")?;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            events
                .lock()
                .unwrap()
                .push(PipelineEvent::Finished(spec_id.clone()));

            if fail {
                anyhow::bail!("injected failure for '{spec_id}'")
            }
            Ok(())
        })
    }
}
