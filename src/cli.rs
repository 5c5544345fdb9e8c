//! Command-line surface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::logging::LogLevel;
use crate::ops::{Operation, StorageOperation, VmOperation};
use crate::vm::lifecycle::PollPolicy;
use crate::vm::snapshot::CreateOptions;

/// ONTAP snapshots and FlexClone mounts for Proxmox VE
#[derive(Parser, Debug)]
#[command(name = "pve-ontap-snapshot", version, about = "ONTAP snapshots for Proxmox VE")]
pub struct Args {
    /// Path to the settings file (default: ./config.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log verbosity; RUST_LOG takes precedence when set
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub loglevel: LogLevel,

    /// Give up waiting for a VM power transition after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snapshots in VM context
    Vm {
        #[command(subcommand)]
        action: VmAction,
    },
    /// Snapshots in storage context
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum VmAction {
    /// Create a VM snapshot using ONTAP file clones
    Create {
        /// Proxmox VM ID
        #[arg(long)]
        vm: u32,
        /// Suspend the VM to disk before creating the snapshot
        #[arg(long, conflicts_with = "shutdown")]
        suspend: bool,
        /// Shut the VM down before creating the snapshot
        #[arg(long)]
        shutdown: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StorageAction {
    /// Create an ONTAP volume snapshot of the storage
    Create {
        #[arg(long)]
        storage: String,
    },
    /// Restore an ONTAP volume snapshot to the storage
    Restore {
        #[arg(long)]
        storage: String,
        #[arg(long)]
        snapshot: String,
    },
    /// Delete an ONTAP volume snapshot
    Delete {
        #[arg(long)]
        storage: String,
        #[arg(long)]
        snapshot: String,
    },
    /// List the tool's ONTAP volume snapshots
    List {
        #[arg(long)]
        storage: String,
    },
    /// Mount a volume snapshot via FlexClone and add it as a new storage
    Mount {
        #[arg(long)]
        storage: String,
        #[arg(long)]
        snapshot: String,
    },
    /// Remove a mounted snapshot's storage and its FlexClone volume
    Unmount {
        #[arg(long)]
        storage: String,
    },
    /// Show metadata of the underlying ONTAP volume
    Show {
        #[arg(long)]
        storage: String,
    },
}

impl Args {
    pub fn operation(&self) -> Operation {
        match &self.command {
            Command::Vm {
                action: VmAction::Create { vm, suspend, shutdown },
            } => Operation::Vm {
                vmid: *vm,
                op: VmOperation::Create(CreateOptions {
                    suspend: *suspend,
                    shutdown: *shutdown,
                }),
            },
            Command::Storage { action } => {
                let (storage, op) = match action {
                    StorageAction::Create { storage } => (storage, StorageOperation::Create),
                    StorageAction::Restore { storage, snapshot } => (
                        storage,
                        StorageOperation::Restore {
                            snapshot: snapshot.clone(),
                        },
                    ),
                    StorageAction::Delete { storage, snapshot } => (
                        storage,
                        StorageOperation::Delete {
                            snapshot: snapshot.clone(),
                        },
                    ),
                    StorageAction::List { storage } => (storage, StorageOperation::List),
                    StorageAction::Mount { storage, snapshot } => (
                        storage,
                        StorageOperation::Mount {
                            snapshot: snapshot.clone(),
                        },
                    ),
                    StorageAction::Unmount { storage } => (storage, StorageOperation::Unmount),
                    StorageAction::Show { storage } => (storage, StorageOperation::Show),
                };
                Operation::Storage {
                    storage: storage.clone(),
                    op,
                }
            }
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::with_timeout(self.timeout.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn vm_create_with_quiesce_flags() {
        let args = parse(&["pve-ontap-snapshot", "vm", "create", "--vm", "100", "--suspend"]);
        assert_eq!(
            args.operation(),
            Operation::Vm {
                vmid: 100,
                op: VmOperation::Create(CreateOptions {
                    suspend: true,
                    shutdown: false,
                }),
            }
        );
    }

    #[test]
    fn storage_mount_carries_snapshot() {
        let args = parse(&[
            "pve-ontap-snapshot",
            "--loglevel",
            "debug",
            "storage",
            "mount",
            "--storage",
            "storageA",
            "--snapshot",
            "proxmox_snapshot_2024-01-01_00:00:00+0000",
        ]);
        assert_eq!(args.loglevel, LogLevel::Debug);
        assert_eq!(
            args.operation(),
            Operation::Storage {
                storage: "storageA".into(),
                op: StorageOperation::Mount {
                    snapshot: "proxmox_snapshot_2024-01-01_00:00:00+0000".into(),
                },
            }
        );
    }

    #[test]
    fn suspend_and_shutdown_are_exclusive() {
        let res = Args::try_parse_from([
            "pve-ontap-snapshot",
            "vm",
            "create",
            "--vm",
            "100",
            "--suspend",
            "--shutdown",
        ]);
        let err = res.expect_err("both quiesce flags must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn restore_requires_snapshot() {
        let res = Args::try_parse_from([
            "pve-ontap-snapshot",
            "storage",
            "restore",
            "--storage",
            "storageA",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn timeout_bounds_polling() {
        let args = parse(&[
            "pve-ontap-snapshot",
            "storage",
            "list",
            "--storage",
            "s",
            "--timeout",
            "30",
        ]);
        assert!(args.poll_policy().deadline.is_some());
        let args = parse(&["pve-ontap-snapshot", "storage", "unmount", "--storage", "s-CLONE"]);
        assert_eq!(args.poll_policy().deadline, None);
    }
}
