//! Operation selection and dispatch.
//!
//! Each entity has a closed set of operations carrying their own parameters.
//! [`dispatch`] builds the entity (which performs discovery) and runs the
//! operation, returning the lines to print on stdout.

use tracing::debug;

use crate::context::{Clients, Entity};
use crate::error::Result;
use crate::ontap::OntapConnector;
use crate::proxmox::ComputeApi;
use crate::storage::StorageContext;
use crate::vm::VmContext;
use crate::vm::lifecycle::PollPolicy;
use crate::vm::snapshot::CreateOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmOperation {
    Create(CreateOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOperation {
    Create,
    Restore { snapshot: String },
    Delete { snapshot: String },
    List,
    Mount { snapshot: String },
    Unmount,
    Show,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Vm { vmid: u32, op: VmOperation },
    Storage { storage: String, op: StorageOperation },
}

pub async fn dispatch<P: ComputeApi, O: OntapConnector>(
    clients: Clients<'_, P, O>,
    operation: Operation,
    policy: &PollPolicy,
) -> Result<Vec<String>> {
    debug!(?operation, "dispatching");
    match operation {
        Operation::Vm { vmid, op } => {
            let mut vm = VmContext::new(clients, vmid).await?;
            debug!("{}", vm.describe());
            match op {
                VmOperation::Create(options) => vm.create(options, policy).await,
            }
        }
        Operation::Storage { storage, op } => {
            let ctx = StorageContext::new(clients, &storage).await?;
            debug!("{}", ctx.describe());
            match op {
                StorageOperation::Create => Ok(vec![ctx.create().await?]),
                StorageOperation::Restore { snapshot } => {
                    ctx.restore(&snapshot).await?;
                    Ok(Vec::new())
                }
                StorageOperation::Delete { snapshot } => {
                    ctx.delete(&snapshot).await?;
                    Ok(Vec::new())
                }
                StorageOperation::List => Ok(ctx
                    .list()
                    .await?
                    .into_iter()
                    .map(|s| format!("Name: {}, Comment: {}", s.name, s.comment))
                    .collect()),
                StorageOperation::Mount { snapshot } => Ok(vec![ctx.mount(&snapshot).await?]),
                StorageOperation::Unmount => {
                    ctx.unmount().await?;
                    Ok(Vec::new())
                }
                StorageOperation::Show => Ok(vec![ctx.show().await?]),
            }
        }
    }
}
