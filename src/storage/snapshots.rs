//! Volume-level snapshots of a storage backend.

use serde_json::json;
use tracing::{debug, info, warn};

use super::StorageContext;
use crate::error::Result;
use crate::naming::{Timestamp, VOLUME_SNAPSHOT_PREFIX, volume_snapshot_name};
use crate::ontap::{OntapConnector, OntapSession};
use crate::proxmox::ComputeApi;

/// A tool-managed snapshot as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub name: String,
    pub comment: String,
}

impl<P: ComputeApi, O: OntapConnector> StorageContext<'_, P, O> {
    /// Snapshot the backing volume now. Returns the snapshot name.
    pub async fn create(&self) -> Result<String> {
        self.create_at(Timestamp::now()).await
    }

    pub async fn create_at(&self, ts: Timestamp) -> Result<String> {
        info!(storage = %self.name, "creating storage snapshot...");
        let volume = self.locate().await?;
        let name = volume_snapshot_name(ts);
        let comment = format!("Snapshot of Proxmox storage {}", self.name);
        debug!(volume = %volume.name, snapshot = %name, "submitting snapshot");

        let session = self.clients().controller.connect(&self.access)?;
        session
            .create_snapshot(&volume.record(), &name, &comment)
            .await?;
        info!(snapshot = %name, "...done");
        Ok(name)
    }

    /// Snapshots carrying the tool's naming prefix, in controller order.
    pub async fn list(&self) -> Result<Vec<SnapshotSummary>> {
        info!(storage = %self.name, "listing storage snapshots...");
        let volume = self.locate().await?;
        let session = self.clients().controller.connect(&self.access)?;
        let summaries: Vec<SnapshotSummary> = session
            .snapshots(&volume.uuid)
            .await?
            .into_iter()
            .filter(|snap| snap.name.starts_with(VOLUME_SNAPSHOT_PREFIX))
            .map(|snap| SnapshotSummary {
                name: snap.name,
                comment: snap.comment.unwrap_or_default(),
            })
            .collect();
        for snap in &summaries {
            info!("Name: {}, Comment: {}", snap.name, snap.comment);
        }
        info!("...done");
        Ok(summaries)
    }

    /// Delete the first snapshot named exactly `snapshot`.
    ///
    /// A missing snapshot is not an error: returns `Ok(false)`.
    pub async fn delete(&self, snapshot: &str) -> Result<bool> {
        info!(storage = %self.name, snapshot, "deleting snapshot...");
        let volume = self.locate().await?;
        let session = self.clients().controller.connect(&self.access)?;
        let found = session
            .snapshots(&volume.uuid)
            .await?
            .into_iter()
            .find(|snap| snap.name == snapshot);
        match found {
            Some(snap) => {
                session.delete_snapshot(&volume.uuid, &snap.uuid).await?;
                info!("...done");
                Ok(true)
            }
            None => {
                warn!(volume = %volume.name, snapshot, "no such snapshot, nothing deleted");
                Ok(false)
            }
        }
    }

    /// Roll the backing volume back to `snapshot`, discarding everything
    /// written since.
    pub async fn restore(&self, snapshot: &str) -> Result<()> {
        info!(storage = %self.name, snapshot, "restoring snapshot...");
        let volume = self.locate().await?;
        let session = self.clients().controller.connect(&self.access)?;
        session
            .cli(
                "volume snapshot restore",
                &json!({
                    "vserver": volume.svm,
                    "volume": volume.name,
                    "snapshot": snapshot,
                    "force": true,
                }),
            )
            .await?;
        info!("...done");
        Ok(())
    }
}
