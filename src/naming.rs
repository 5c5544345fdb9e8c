//! Snapshot and clone naming.
//!
//! Names embed a second-resolution UTC timestamp. Two operations against the
//! same volume within one second produce the same name; the controller then
//! rejects the second one.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

/// Prefix of every volume snapshot this tool creates.
pub const VOLUME_SNAPSHOT_PREFIX: &str = "proxmox_snapshot_";

/// Suffix of the compute-node backend registered for a mounted snapshot.
pub const CLONE_SUFFIX: &str = "-CLONE";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S+0000";

/// UTC instant shared by every name generated in one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// `<stem>-snapshot-<timestamp><ext>` for a disk image file name.
pub fn disk_snapshot_name(file_name: &str, ts: Timestamp) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{stem}-snapshot-{ts}{ext}")
}

pub fn volume_snapshot_name(ts: Timestamp) -> String {
    format!("{VOLUME_SNAPSHOT_PREFIX}{ts}")
}

pub fn clone_volume_name(volume: &str) -> String {
    format!("{volume}_clone")
}

pub fn clone_backend_name(backend: &str) -> String {
    format!("{backend}{CLONE_SUFFIX}")
}
