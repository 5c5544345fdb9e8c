//! VM context: a Proxmox VM and the storage backends its disks live on.
//!
//! Provides discovery of the VM across cluster nodes, disk-to-volume mapping,
//! power transitions used to quiesce the VM, and per-disk file clones.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::AccessBundle;
use crate::context::{Clients, Entity};
use crate::error::{Result, SnapshotError};
use crate::ontap::OntapConnector;
use crate::proxmox::ComputeApi;
use crate::storage::StorageContext;

pub mod disks;
pub mod lifecycle;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Shared types used across submodules
// ---------------------------------------------------------------------------

/// Power state reported by `status/current` once a VM is fully stopped.
pub const STATUS_STOPPED: &str = "stopped";
pub const STATUS_RUNNING: &str = "running";

/// One storage backend used by the VM together with the VM's disks on it.
pub struct StorageBinding<'a, P, O> {
    pub storage: StorageContext<'a, P, O>,
    /// Disk paths relative to the backend's `images/` directory.
    pub disks: Vec<String>,
}

pub struct VmContext<'a, P, O> {
    clients: Clients<'a, P, O>,
    pub id: u32,
    pub name: String,
    pub node: String,
    pub status: String,
    pub config: BTreeMap<String, String>,
    pub bindings: Vec<StorageBinding<'a, P, O>>,
}

impl<'a, P: ComputeApi, O: OntapConnector> VmContext<'a, P, O> {
    /// Find `vmid` on the first node that knows it and map its disks.
    pub async fn new(clients: Clients<'a, P, O>, vmid: u32) -> Result<Self> {
        let nodes = clients.compute.nodes().await?;
        debug!(?nodes, "found Proxmox nodes");

        let mut found = None;
        for node in nodes {
            // An HTTP error means the node does not know the VM; anything
            // else (transport, decoding) is a real failure.
            let status = match clients.compute.vm_status(&node.node, vmid).await {
                Ok(status) => status,
                Err(e) if e.is_http_rejection() => {
                    debug!(node = %node.node, vmid, error = %e, "VM not on node");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let config = match clients.compute.vm_config(&node.node, vmid).await {
                Ok(config) => config,
                Err(e) if e.is_http_rejection() => {
                    debug!(node = %node.node, vmid, error = %e, "VM config unavailable on node");
                    continue;
                }
                Err(e) => return Err(e),
            };
            found = Some((node.node, status, config));
            break;
        }
        let (node, status, config) = found
            .ok_or_else(|| SnapshotError::compute(format!("VM {vmid} not found on any node")))?;

        let mut bindings = Vec::new();
        for group in disks::map_disks(&config)? {
            let storage = StorageContext::new(clients, &group.storage).await?;
            bindings.push(StorageBinding {
                storage,
                disks: group.disks,
            });
        }

        Ok(Self {
            clients,
            id: vmid,
            name: status.name.unwrap_or_default(),
            node,
            status: status.status,
            config,
            bindings,
        })
    }

    pub(crate) fn clients(&self) -> Clients<'a, P, O> {
        self.clients
    }
}

impl<P, O> Entity for VmContext<'_, P, O> {
    fn resolve_access(&self, backend: &str) -> Result<AccessBundle> {
        self.clients.config.resolve_access(backend)
    }

    fn describe(&self) -> String {
        let storages: Vec<String> = self
            .bindings
            .iter()
            .map(|b| format!("{} ({})", b.storage.describe().replace('\n', ", "), b.disks.join(", ")))
            .collect();
        format!(
            "VM name:   {}\nVM id:     {}\nVM node:   {}\nVM status: {}\nVM config: {:?}\nStorage:   {:?}",
            self.name, self.id, self.node, self.status, self.config, storages
        )
    }
}
