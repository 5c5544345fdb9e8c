//! `reqwest` implementation of [`ComputeApi`] against `https://<host>/api2/json`.
//!
//! Authentication is ticket based: `login` posts the credentials to
//! `/access/ticket`, every request then carries the `PVEAuthCookie` and
//! write requests additionally carry the `CSRFPreventionToken` header.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ComputeApi, NewStorage, NodeInfo, PowerAction, StorageConfig, TaskStatus, Upid, VmStatus};
use crate::config::AccessBundle;
use crate::error::{Result, SnapshotError};

const DEFAULT_PORT: u16 = 8006;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Ticket {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

/// An authenticated Proxmox VE API session.
pub struct ProxmoxClient {
    http: reqwest::Client,
    base: String,
    ticket: String,
    csrf_token: String,
}

impl ProxmoxClient {
    /// Authenticate against the cluster described by `access`.
    pub async fn login(access: &AccessBundle) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!access.verify)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SnapshotError::compute(format!("building HTTP client: {e}")))?;
        let base = api_base(&access.host);

        debug!(base = %base, user = %access.user, "logging in to Proxmox VE");
        let resp = http
            .post(format!("{base}/access/ticket"))
            .form(&[("username", &access.user), ("password", &access.password)])
            .send()
            .await
            .map_err(|e| SnapshotError::compute(format!("POST /access/ticket: {e}")))?;
        let ticket: Envelope<Ticket> = decode(Method::POST, "/access/ticket", resp).await?;

        Ok(Self {
            http,
            base,
            ticket: ticket.data.ticket,
            csrf_token: ticket.data.csrf_token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method.clone(), format!("{}{path}", self.base))
            .header(reqwest::header::COOKIE, format!("PVEAuthCookie={}", self.ticket));
        if method == Method::GET {
            builder
        } else {
            builder.header("CSRFPreventionToken", &self.csrf_token)
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<T> {
        debug!(%method, path, "proxmox request");
        let resp = builder
            .send()
            .await
            .map_err(|e| SnapshotError::compute(format!("{method} {path}: {e}")))?;
        let envelope: Envelope<T> = decode(method, path, resp).await?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(Method::GET, path, self.request(Method::GET, path)).await
    }
}

/// `https://<host>:8006/api2/json`, keeping an explicit scheme or port.
fn api_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let authority = with_scheme.split("://").nth(1).unwrap_or_default();
    if authority.contains(':') {
        format!("{with_scheme}/api2/json")
    } else {
        format!("{with_scheme}:{DEFAULT_PORT}/api2/json")
    }
}

async fn decode<T: DeserializeOwned>(method: Method, path: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SnapshotError::compute_http(
            status.as_u16(),
            format!("{method} {path}: HTTP {}: {}", status.as_u16(), body.trim()),
        ));
    }
    resp.json()
        .await
        .map_err(|e| SnapshotError::compute(format!("{method} {path}: decoding response: {e}")))
}

fn stringify(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl ComputeApi for ProxmoxClient {
    async fn nodes(&self) -> Result<Vec<NodeInfo>> {
        self.get("/nodes").await
    }

    async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus> {
        self.get(&format!("/nodes/{node}/qemu/{vmid}/status/current"))
            .await
    }

    async fn vm_config(&self, node: &str, vmid: u32) -> Result<BTreeMap<String, String>> {
        let raw: BTreeMap<String, serde_json::Value> =
            self.get(&format!("/nodes/{node}/qemu/{vmid}/config")).await?;
        Ok(raw.into_iter().map(|(k, v)| (k, stringify(v))).collect())
    }

    async fn vm_action(&self, node: &str, vmid: u32, action: PowerAction) -> Result<Upid> {
        let path = format!("/nodes/{node}/qemu/{vmid}/status/{}", action.endpoint());
        let mut builder = self.request(Method::POST, &path);
        if let PowerAction::Suspend { to_disk: true } = action {
            builder = builder.form(&[("todisk", "1")]);
        }
        self.call(Method::POST, &path, builder).await
    }

    async fn task_status(&self, node: &str, upid: &Upid) -> Result<TaskStatus> {
        self.get(&format!("/nodes/{node}/tasks/{upid}/status")).await
    }

    async fn storage(&self, name: &str) -> Result<StorageConfig> {
        self.get(&format!("/storage/{name}")).await
    }

    async fn create_storage(&self, storage: &NewStorage) -> Result<()> {
        let builder = self.request(Method::POST, "/storage").form(storage);
        let _: serde_json::Value = self.call(Method::POST, "/storage", builder).await?;
        Ok(())
    }

    async fn delete_storage(&self, name: &str) -> Result<()> {
        let path = format!("/storage/{name}");
        let builder = self.request(Method::DELETE, &path);
        let _: serde_json::Value = self.call(Method::DELETE, &path, builder).await?;
        Ok(())
    }
}
