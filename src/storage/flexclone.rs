//! Mounting a volume snapshot as a new Proxmox storage via FlexClone.
//!
//! A mount pairs two objects: the clone volume `<volume>_clone` on the
//! controller and the backend `<backend>-CLONE` on the cluster. The backend is
//! only registered once the clone exists, and unmount removes the backend
//! before the volume, so a backend never points at a deleted volume.

use tracing::{error, info};

use super::StorageContext;
use crate::error::{Result, SnapshotError};
use crate::naming::{clone_backend_name, clone_volume_name};
use crate::ontap::{CloneVolumeRequest, OntapConnector, OntapSession};
use crate::proxmox::{ComputeApi, NewStorage};

impl<P: ComputeApi, O: OntapConnector> StorageContext<'_, P, O> {
    /// Clone the backing volume at `snapshot` and register the clone as
    /// `<backend>-CLONE`. Returns the new backend name.
    pub async fn mount(&self, snapshot: &str) -> Result<String> {
        info!(storage = %self.name, snapshot, "mounting volume snapshot...");
        let clients = self.clients();
        let parent = self.locate().await?;

        let clone_name = clone_volume_name(&self.volume_name);
        let junction_path = format!("/{clone_name}");
        let request = CloneVolumeRequest {
            name: clone_name.clone(),
            svm: parent.svm.clone(),
            parent_volume: self.volume_name.clone(),
            parent_snapshot: snapshot.to_string(),
            junction_path: junction_path.clone(),
        };

        {
            let session = clients.controller.connect(&self.access)?;
            if let Err(e) = session.create_volume(&request).await {
                error!(
                    volume = %clone_name,
                    error = %e,
                    "clone volume creation failed, storage not registered"
                );
                return Err(e);
            }
        }

        let original = clients.compute.storage(&self.name).await?;
        let backend = clone_backend_name(&self.name);
        let registration = NewStorage {
            storage: backend.clone(),
            kind: original.kind,
            server: original.server,
            content: original.content,
            export: junction_path,
        };
        if let Err(e) = clients.compute.create_storage(&registration).await {
            error!(
                volume = %clone_name,
                storage = %backend,
                error = %e,
                "clone volume exists but storage registration failed"
            );
            return Err(e);
        }

        info!(storage = %backend, "...done");
        Ok(backend)
    }

    /// Remove a mounted snapshot: deregister the backend, then force-delete
    /// the clone volume. Refuses anything that is not a FlexClone.
    pub async fn unmount(&self) -> Result<()> {
        info!(storage = %self.name, "unmounting mounted volume snapshot...");
        let clients = self.clients();
        let volume = self.locate().await?;
        if !volume.is_flexclone() {
            error!(storage = %self.name, volume = %volume.name, "not a mounted volume snapshot");
            return Err(SnapshotError::NotAMountedSnapshot {
                storage: self.name.clone(),
            });
        }

        clients.compute.delete_storage(&self.name).await?;
        let session = clients.controller.connect(&self.access)?;
        session.delete_volume(&volume.uuid, true).await?;
        info!("...done");
        Ok(())
    }
}
