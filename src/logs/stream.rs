// src/logs/stream.rs

//! Log streaming: one-shot dump and `tail -f` style follow.
//!
//! Follow mode is a bounded-interval poll reading from a byte offset; an
//! OS file-watch API could replace it without changing the contract.
//! Deadline behaviour composes from the outside via
//! `tokio::time::timeout`.

use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;
use tracing::debug;

use crate::errors::Result;

/// Interval between polls in follow mode.
pub const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Stream a log file's contents into `out`.
///
/// - `follow = false`: read the file once and return. A missing file is
///   treated as empty (no error, no delay).
/// - `follow = true`: emit existing content, then keep polling for newly
///   appended bytes until `cancel` fires.
pub async fn stream_logs<W: Write>(
    path: &Path,
    follow: bool,
    mut cancel: watch::Receiver<bool>,
    out: &mut W,
) -> Result<()> {
    if !follow {
        match tokio::fs::read(path).await {
            Ok(bytes) => out.write_all(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "log file does not exist yet; treating as empty");
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    let mut offset: u64 = 0;

    loop {
        offset = emit_from_offset(path, offset, out).await?;

        tokio::select! {
            _ = tokio::time::sleep(FOLLOW_POLL_INTERVAL) => {}
            _ = cancel.changed() => {
                debug!(path = %path.display(), "log follow cancelled");
                return Ok(());
            }
        }
    }
}

/// Read bytes appended past `offset` into `out`, returning the new offset.
///
/// A missing file leaves the offset untouched; a truncated file (shorter
/// than the offset) restarts from the beginning, matching `tail -f`
/// behaviour on log rotation.
async fn emit_from_offset<W: Write>(path: &Path, offset: u64, out: &mut W) -> Result<u64> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(offset),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata().await?.len();
    let start = if len < offset { 0 } else { offset };

    if len == start {
        return Ok(start);
    }

    file.seek(SeekFrom::Start(start)).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    out.write_all(&buf)?;
    out.flush()?;

    Ok(start + buf.len() as u64)
}
