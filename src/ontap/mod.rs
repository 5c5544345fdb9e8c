//! Storage-controller (ONTAP) API contract.
//!
//! Each logical unit of work opens its own session through
//! [`OntapConnector::connect`] and drops it when done; sessions are never
//! shared between unrelated operations.

use serde::Deserialize;
use serde_json::json;

use crate::config::AccessBundle;
use crate::error::Result;

pub mod client;

pub use client::RestConnector;

/// Entry of the volume collection: just enough to pick a volume by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeRecord {
    pub name: String,
    pub uuid: String,
}

/// FlexClone relationship of a volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneInfo {
    pub is_flexclone: bool,
    pub parent_volume: Option<String>,
    pub parent_snapshot: Option<String>,
}

/// A fully fetched volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub name: String,
    pub uuid: String,
    /// Owning storage VM (vserver).
    pub svm: String,
    pub flexclone: CloneInfo,
    pub nas_path: Option<String>,
    /// The complete record as returned by the controller, for `show`.
    pub raw: serde_json::Value,
}

impl Volume {
    pub fn is_flexclone(&self) -> bool {
        self.flexclone.is_flexclone
    }

    pub fn record(&self) -> VolumeRecord {
        VolumeRecord {
            name: self.name.clone(),
            uuid: self.uuid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request for a read-write FlexClone of `parent_volume` at `parent_snapshot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneVolumeRequest {
    pub name: String,
    pub svm: String,
    pub parent_volume: String,
    pub parent_snapshot: String,
    pub junction_path: String,
}

impl CloneVolumeRequest {
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "svm": { "name": self.svm },
            "clone": {
                "parent_volume": { "name": self.parent_volume },
                "parent_snapshot": { "name": self.parent_snapshot },
                "is_flexclone": true,
                "type": "rw",
            },
            "nas": { "path": self.junction_path },
        })
    }
}

/// Copy-on-write clone of one file inside a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCloneRequest {
    pub volume: VolumeRecord,
    pub source_path: String,
    pub destination_path: String,
    pub overwrite_destination: bool,
}

impl FileCloneRequest {
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "volume": { "name": self.volume.name, "uuid": self.volume.uuid },
            "source_path": self.source_path,
            "destination_path": self.destination_path,
            "overwrite_destination": self.overwrite_destination,
        })
    }
}

/// Opens scoped sessions to a storage controller.
pub trait OntapConnector {
    type Session: OntapSession;

    fn connect(&self, access: &AccessBundle) -> Result<Self::Session>;
}

/// Operations available on an open controller session.
#[allow(async_fn_in_trait)]
pub trait OntapSession {
    async fn volumes(&self) -> Result<Vec<VolumeRecord>>;

    async fn volume(&self, uuid: &str) -> Result<Volume>;

    async fn snapshots(&self, volume_uuid: &str) -> Result<Vec<SnapshotRecord>>;

    async fn create_snapshot(&self, volume: &VolumeRecord, name: &str, comment: &str) -> Result<()>;

    async fn delete_snapshot(&self, volume_uuid: &str, snapshot_uuid: &str) -> Result<()>;

    async fn create_volume(&self, request: &CloneVolumeRequest) -> Result<()>;

    async fn delete_volume(&self, uuid: &str, force: bool) -> Result<()>;

    async fn file_clone(&self, request: &FileCloneRequest) -> Result<()>;

    /// Run an administrative CLI command (e.g. `volume snapshot restore`).
    async fn cli(&self, command: &str, params: &serde_json::Value) -> Result<()>;
}
