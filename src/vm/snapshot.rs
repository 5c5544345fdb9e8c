//! Per-disk snapshots of a VM using ONTAP file clones.
//!
//! Each disk image is cloned next to itself inside the volume:
//! `images/100/vm-100-disk-0.qcow2` →
//! `images/100/vm-100-disk-0-snapshot-<timestamp>.qcow2`.

use tracing::{error, info, warn};

use super::lifecycle::PollPolicy;
use super::{STATUS_STOPPED, VmContext};
use crate::error::{Result, SnapshotError};
use crate::naming::{Timestamp, disk_snapshot_name};
use crate::ontap::{FileCloneRequest, OntapConnector, OntapSession};
use crate::proxmox::ComputeApi;

/// How to quiesce the VM around the clones. At most one quiesce action is
/// issued; `suspend` wins when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub suspend: bool,
    pub shutdown: bool,
}

impl CreateOptions {
    fn quiesces(&self) -> bool {
        self.suspend || self.shutdown
    }
}

/// `(source, destination)` paths of a disk clone, relative to the volume root.
pub fn clone_paths(disk: &str, ts: Timestamp) -> (String, String) {
    let (dir, file) = disk.rsplit_once('/').unwrap_or(("", disk));
    let name = disk_snapshot_name(file, ts);
    let destination = if dir.is_empty() {
        format!("images/{name}")
    } else {
        format!("images/{dir}/{name}")
    };
    (format!("images/{disk}"), destination)
}

impl<P: ComputeApi, O: OntapConnector> VmContext<'_, P, O> {
    /// Snapshot every mapped disk. Returns the destination paths created.
    pub async fn create(&mut self, options: CreateOptions, policy: &PollPolicy) -> Result<Vec<String>> {
        self.create_at(options, policy, Timestamp::now()).await
    }

    pub async fn create_at(
        &mut self,
        options: CreateOptions,
        policy: &PollPolicy,
        ts: Timestamp,
    ) -> Result<Vec<String>> {
        if options.suspend {
            self.suspend(policy).await?;
        } else if options.shutdown {
            self.shutdown(policy).await?;
        }
        if self.status != STATUS_STOPPED {
            warn!(
                vmid = self.id,
                status = %self.status,
                "creating snapshot of a running vm, the result might be inconsistent"
            );
        }

        info!(vmid = self.id, name = %self.name, "creating vm disk snapshot...");
        let cloned = self.clone_disks(ts).await;

        // Bring the VM back even when a clone failed.
        if options.quiesces() {
            self.start(policy).await?;
        }
        let cloned = cloned?;
        info!(disks = cloned.len(), "...done");
        Ok(cloned)
    }

    async fn clone_disks(&self, ts: Timestamp) -> Result<Vec<String>> {
        let controller = self.clients().controller;
        let mut created = Vec::new();
        let mut failed = Vec::new();

        for binding in &self.bindings {
            let volume = binding.storage.locate().await?;
            let session = controller.connect(&binding.storage.access)?;
            for disk in &binding.disks {
                let (source_path, destination_path) = clone_paths(disk, ts);
                let request = FileCloneRequest {
                    volume: volume.record(),
                    source_path,
                    destination_path: destination_path.clone(),
                    overwrite_destination: false,
                };
                match session.file_clone(&request).await {
                    Ok(()) => {
                        info!(volume = %volume.name, destination = %destination_path, "disk cloned");
                        created.push(destination_path);
                    }
                    Err(e) => {
                        error!(volume = %volume.name, disk = %disk, error = %e, "disk clone failed");
                        failed.push(disk.clone());
                    }
                }
            }
        }

        if failed.is_empty() {
            Ok(created)
        } else {
            Err(SnapshotError::controller(format!(
                "file clone failed for {}",
                failed.join(", ")
            )))
        }
    }
}
