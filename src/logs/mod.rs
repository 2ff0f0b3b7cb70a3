// src/logs/mod.rs

//! Log access: path resolution across both layouts plus dump/follow
//! streaming. Works off persisted run state only, so it is independent of
//! any live run.

pub mod path;
pub mod stream;

pub use path::{LogLocation, location_for, resolve_log_path};
pub use stream::{FOLLOW_POLL_INTERVAL, stream_logs};
