// tests/log_access.rs

//! Log path resolution across both layouts, plus dump/follow streaming.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use specdag::errors::SpecdagError;
use specdag::logs::path::{LogLocation, location_for, resolve_log_path};
use specdag::logs::stream::stream_logs;
use specdag::run::state::DagRun;
use tokio::sync::watch;
use tokio::time::timeout;
use specdag_test_utils::builders::{DagBuilder, feature};
use specdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn run_with_log_base(state_dir: &Path, log_base: &str) -> DagRun {
    let def = DagBuilder::new("demo")
        .layer("l1", vec![feature("foo")])
        .build();
    let mut run = DagRun::new(&def, Path::new("demo.yaml"), state_dir);
    run.log_base = log_base.to_string();
    run
}

/// `Write` impl backed by a shared buffer, so a spawned follow task's
/// output can be inspected from the test body.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn hierarchical_layout_joins_log_base_and_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut run = run_with_log_base(dir.path(), "/cache/proj/dag");
    run.specs.get_mut("foo").unwrap().log_file = "foo.log".to_string();

    let path = resolve_log_path(dir.path(), &run, "foo")?;
    assert_eq!(path, PathBuf::from("/cache/proj/dag/foo.log"));

    let location = location_for(dir.path(), &run, "foo")?;
    assert!(matches!(location, LogLocation::Hierarchical { .. }));
    Ok(())
}

#[test]
fn empty_log_base_falls_back_to_legacy_flat_layout() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut run = run_with_log_base(dir.path(), "");
    // Legacy runs predate per-spec log filenames too.
    run.specs.get_mut("foo").unwrap().log_file = String::new();

    let path = resolve_log_path(dir.path(), &run, "foo")?;
    assert_eq!(path, dir.path().join("logs").join("foo.log"));

    let location = location_for(dir.path(), &run, "foo")?;
    assert!(matches!(location, LogLocation::LegacyFlat { .. }));
    Ok(())
}

#[test]
fn empty_log_file_alone_also_falls_back() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut run = run_with_log_base(dir.path(), "/cache/proj/dag");
    run.specs.get_mut("foo").unwrap().log_file = String::new();

    let path = resolve_log_path(dir.path(), &run, "foo")?;
    assert_eq!(path, dir.path().join("logs").join("foo.log"));
    Ok(())
}

#[test]
fn unknown_spec_is_spec_not_found() -> TestResult {
    let dir = tempfile::tempdir()?;
    let run = run_with_log_base(dir.path(), "");

    match resolve_log_path(dir.path(), &run, "ghost") {
        Err(SpecdagError::SpecNotFound(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected SpecNotFound, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn dump_of_missing_file_returns_promptly_and_empty() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nope.log");
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let mut out = Vec::new();

    timeout(
        Duration::from_millis(500),
        stream_logs(&path, false, cancel_rx, &mut out),
    )
    .await
    .expect("dump should not block")?;

    assert!(out.is_empty());
    Ok(())
}

#[tokio::test]
async fn dump_emits_full_file_contents() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("spec.log");
    std::fs::write(&path, "line one\nline two\n")?;

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let mut out = Vec::new();
    stream_logs(&path, false, cancel_rx, &mut out).await?;

    assert_eq!(String::from_utf8(out)?, "line one\nline two\n");
    Ok(())
}

#[tokio::test]
async fn follow_with_expired_deadline_returns_elapsed() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("spec.log");
    std::fs::write(&path, "existing\n")?;

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let mut out = Vec::new();

    let result = timeout(
        Duration::from_millis(50),
        stream_logs(&path, true, cancel_rx, &mut out),
    )
    .await;

    assert!(result.is_err(), "follow should still be running at deadline");
    Ok(())
}

#[tokio::test]
async fn follow_picks_up_appended_lines_until_cancelled() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("spec.log");
    std::fs::write(&path, "first\n")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let buf = SharedBuf::default();

    let mut task_buf = buf.clone();
    let follow_path = path.clone();
    let handle = tokio::spawn(async move {
        stream_logs(&follow_path, true, cancel_rx, &mut task_buf).await
    });

    // Give the first poll a chance, then append and wait past one interval.
    tokio::time::sleep(Duration::from_millis(300)).await;
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path)?;
        writeln!(file, "second")?;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    cancel_tx.send(true)?;
    timeout(Duration::from_secs(2), handle).await??.expect("follow failed");

    let seen = buf.contents();
    assert!(seen.contains("first"), "missing initial content: {seen:?}");
    assert!(seen.contains("second"), "missing appended content: {seen:?}");
    Ok(())
}
