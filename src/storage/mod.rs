//! Storage context: one Proxmox storage backend and the ONTAP volume that
//! exports it.
//!
//! ```text
//! StorageContext::new(backend)
//!     ├─► GET /storage/<backend>          → export path → volume name
//!     └─► config[<backend> minus -CLONE]  → AccessBundle
//!
//! snapshots.rs   create / list / delete / restore   (volume snapshots)
//! flexclone.rs   mount / unmount                     (FlexClone + backend)
//! locator.rs     volume name → Volume
//! ```

use tracing::debug;

use crate::config::AccessBundle;
use crate::context::{Clients, Entity};
use crate::error::{Result, SnapshotError};
use crate::ontap::{OntapConnector, Volume};
use crate::proxmox::ComputeApi;

pub mod flexclone;
pub mod locator;
pub mod snapshots;

pub use snapshots::SnapshotSummary;

pub struct StorageContext<'a, P, O> {
    clients: Clients<'a, P, O>,
    /// Proxmox storage backend name.
    pub name: String,
    /// ONTAP volume backing the export.
    pub volume_name: String,
    pub access: AccessBundle,
}

impl<'a, P: ComputeApi, O: OntapConnector> StorageContext<'a, P, O> {
    pub async fn new(clients: Clients<'a, P, O>, name: &str) -> Result<Self> {
        debug!(storage = name, "resolving storage");
        let backend = clients.compute.storage(name).await?;
        let export = backend
            .export
            .ok_or_else(|| SnapshotError::config(format!("storage {name} has no export path")))?;
        let volume_name = export.trim_matches('/').to_string();
        if volume_name.is_empty() {
            return Err(SnapshotError::config(format!(
                "storage {name} has an empty export path"
            )));
        }
        let access = clients.config.resolve_access(name)?;
        Ok(Self {
            clients,
            name: name.to_string(),
            volume_name,
            access,
        })
    }

    pub(crate) fn clients(&self) -> Clients<'a, P, O> {
        self.clients
    }

    /// The backing volume; `VolumeNotFound` if the controller has none.
    pub async fn locate(&self) -> Result<Volume> {
        locator::require_volume(self.clients.controller, &self.volume_name, &self.access).await
    }

    /// Full controller record of the backing volume as pretty JSON.
    pub async fn show(&self) -> Result<String> {
        let volume = self.locate().await?;
        serde_json::to_string_pretty(&volume.raw)
            .map_err(|e| SnapshotError::controller(format!("rendering volume record: {e}")))
    }
}

impl<P, O> Entity for StorageContext<'_, P, O> {
    fn resolve_access(&self, backend: &str) -> Result<AccessBundle> {
        self.clients.config.resolve_access(backend)
    }

    fn describe(&self) -> String {
        format!(
            "Storage name:   {}\nStorage volume: {}\nStorage access: {:?}",
            self.name, self.volume_name, self.access
        )
    }
}
