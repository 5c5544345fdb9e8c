//! Error types for pve-ontap-snapshot.
//!
//! Every failure the orchestration core can report maps onto one of these
//! variants. The binary turns any of them into exit status 1.

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Missing config section/key, unreadable config file or a malformed
    /// disk entry in a VM's configuration.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("volume not found: {volume}")]
    VolumeNotFound { volume: String },

    /// The storage controller rejected a request.
    #[error("storage controller error: {reason}")]
    StorageController { reason: String },

    /// A compute-node request or task failed. `status` is set when the API
    /// answered with an HTTP error rather than failing in transport.
    #[error("compute node error: {reason}")]
    ComputeNode { status: Option<u16>, reason: String },

    #[error("{storage} is not a mounted volume snapshot")]
    NotAMountedSnapshot { storage: String },

    #[error("timed out waiting for task {task} to reach status {expected}")]
    Timeout { task: String, expected: String },
}

impl SnapshotError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn controller(reason: impl Into<String>) -> Self {
        Self::StorageController {
            reason: reason.into(),
        }
    }

    pub fn compute(reason: impl Into<String>) -> Self {
        Self::ComputeNode {
            status: None,
            reason: reason.into(),
        }
    }

    pub fn compute_http(status: u16, reason: impl Into<String>) -> Self {
        Self::ComputeNode {
            status: Some(status),
            reason: reason.into(),
        }
    }

    /// The compute node answered, but with an HTTP error status.
    pub fn is_http_rejection(&self) -> bool {
        matches!(self, Self::ComputeNode { status: Some(_), .. })
    }
}
