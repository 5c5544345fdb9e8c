//! Compute-node (Proxmox VE) API contract.
//!
//! The orchestration core only talks to the cluster through [`ComputeApi`].
//! [`client::ProxmoxClient`] implements it over the `api2/json` REST API;
//! tests substitute in-memory fakes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod client;

pub use client::ProxmoxClient;

/// One cluster member as listed by `GET /nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    pub node: String,
}

/// `GET /nodes/{node}/qemu/{vmid}/status/current`, reduced to what we use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VmStatus {
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Opaque task handle (UPID) returned by asynchronous VM actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Upid(pub String);

impl fmt::Display for Upid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `GET /nodes/{node}/tasks/{upid}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default)]
    pub exitstatus: Option<String>,
}

/// Power action issued against a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    /// `to_disk` selects hibernation instead of suspend-to-RAM.
    Suspend { to_disk: bool },
    Start,
}

impl PowerAction {
    /// Path segment under `/status/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Suspend { .. } => "suspend",
            Self::Start => "start",
        }
    }
}

/// A storage backend definition from `GET /storage/{storage}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    pub storage: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub export: Option<String>,
}

/// Body of `POST /storage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStorage {
    pub storage: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub export: String,
}

/// Everything the orchestration core needs from the compute-node manager.
#[allow(async_fn_in_trait)]
pub trait ComputeApi {
    async fn nodes(&self) -> Result<Vec<NodeInfo>>;

    async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus>;

    /// Raw VM configuration with every value rendered as a string.
    async fn vm_config(&self, node: &str, vmid: u32) -> Result<BTreeMap<String, String>>;

    async fn vm_action(&self, node: &str, vmid: u32, action: PowerAction) -> Result<Upid>;

    async fn task_status(&self, node: &str, upid: &Upid) -> Result<TaskStatus>;

    async fn storage(&self, name: &str) -> Result<StorageConfig>;

    async fn create_storage(&self, storage: &NewStorage) -> Result<()>;

    async fn delete_storage(&self, name: &str) -> Result<()>;
}
