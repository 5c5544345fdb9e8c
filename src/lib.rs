//! pve-ontap-snapshot: NetApp ONTAP snapshots for Proxmox VE.
//!
//! Two entry points share one set of clients:
//!
//! - **VM context**: per-disk file clones of a VM's images, optionally with
//!   the VM suspended or shut down around them.
//! - **Storage context**: volume snapshots of a storage backend, plus
//!   mounting a snapshot as a FlexClone-backed storage and removing it again.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod naming;
pub mod ontap;
pub mod ops;
pub mod paths;
pub mod proxmox;
pub mod state_machine;
pub mod storage;
pub mod vm;
