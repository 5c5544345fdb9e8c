//! `reqwest` implementation of the ONTAP REST API (`https://<host>/api`).
//!
//! Requests use HTTP basic auth. Mutating calls that the controller runs as
//! background jobs answer `202 Accepted` with a job reference; those jobs are
//! awaited here so every session method returns only once the change is
//! applied (or has failed).

use std::time::Duration;

use reqwest::{Method, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    CloneInfo, CloneVolumeRequest, FileCloneRequest, OntapConnector, OntapSession, SnapshotRecord,
    Volume, VolumeRecord,
};
use crate::config::AccessBundle;
use crate::error::{Result, SnapshotError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const JOB_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct JobLink {
    uuid: String,
}

#[derive(Debug, Default, Deserialize)]
struct Accepted {
    #[serde(default)]
    job: Option<JobLink>,
}

#[derive(Debug, Deserialize)]
struct Job {
    state: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct CloneDetail {
    #[serde(default)]
    is_flexclone: bool,
    #[serde(default)]
    parent_volume: Option<NameRef>,
    #[serde(default)]
    parent_snapshot: Option<NameRef>,
}

#[derive(Debug, Default, Deserialize)]
struct NasDetail {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VolumeDetail {
    name: String,
    uuid: String,
    #[serde(default)]
    svm: Option<NameRef>,
    #[serde(default)]
    clone: Option<CloneDetail>,
    #[serde(default)]
    nas: Option<NasDetail>,
}

/// Build a [`Volume`] from a full volume record.
pub fn volume_from_record(raw: serde_json::Value) -> Result<Volume> {
    let detail: VolumeDetail = serde_json::from_value(raw.clone())
        .map_err(|e| SnapshotError::controller(format!("unexpected volume record: {e}")))?;
    let clone = detail.clone.unwrap_or_default();
    Ok(Volume {
        name: detail.name,
        uuid: detail.uuid,
        svm: detail.svm.map(|s| s.name).unwrap_or_default(),
        flexclone: CloneInfo {
            is_flexclone: clone.is_flexclone,
            parent_volume: clone.parent_volume.map(|v| v.name),
            parent_snapshot: clone.parent_snapshot.map(|s| s.name),
        },
        nas_path: detail.nas.and_then(|n| n.path),
        raw,
    })
}

/// Connector producing [`RestSession`]s.
#[derive(Debug, Clone, Default)]
pub struct RestConnector;

impl OntapConnector for RestConnector {
    type Session = RestSession;

    fn connect(&self, access: &AccessBundle) -> Result<RestSession> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!access.verify)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SnapshotError::controller(format!("building HTTP client: {e}")))?;
        Ok(RestSession {
            http,
            base: api_base(&access.host),
            user: access.user.clone(),
            password: access.password.clone(),
        })
    }
}

/// One scoped connection to a cluster management LIF.
pub struct RestSession {
    http: reqwest::Client,
    base: String,
    user: String,
    password: String,
}

fn api_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        format!("{host}/api")
    } else {
        format!("https://{host}/api")
    }
}

/// `volume snapshot restore` → `/private/cli/volume/snapshot/restore`.
fn cli_path(command: &str) -> String {
    let segments: Vec<&str> = command.split_whitespace().collect();
    format!("/private/cli/{}", segments.join("/"))
}

impl RestSession {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        debug!(%method, path, "ontap request");
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{path}", self.base))
            .basic_auth(&self.user, Some(&self.password));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| SnapshotError::controller(format!("{method} {path}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SnapshotError::controller(format!(
                "{method} {path}: HTTP {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None)
            .await?
            .json()
            .await
            .map_err(|e| SnapshotError::controller(format!("GET {path}: decoding response: {e}")))
    }

    /// Send a mutating request and wait for any job it started.
    async fn mutate(&self, method: Method, path: &str, body: Option<&serde_json::Value>) -> Result<()> {
        let resp = self.send(method, path, body).await?;
        let accepted: Accepted = resp.json().await.unwrap_or_default();
        match accepted.job {
            Some(job) => self.wait_job(&job.uuid).await,
            None => Ok(()),
        }
    }

    async fn wait_job(&self, uuid: &str) -> Result<()> {
        let path = format!("/cluster/jobs/{uuid}?fields=state,message");
        loop {
            let job: Job = self.get(&path).await?;
            debug!(job = uuid, state = %job.state, "ontap job");
            match job.state.as_str() {
                "success" => return Ok(()),
                "failure" => {
                    return Err(SnapshotError::controller(format!(
                        "job {uuid} failed: {}",
                        job.message.unwrap_or_default()
                    )));
                }
                _ => tokio::time::sleep(JOB_POLL_INTERVAL).await,
            }
        }
    }
}

impl OntapSession for RestSession {
    async fn volumes(&self) -> Result<Vec<VolumeRecord>> {
        let page: Collection<VolumeRecord> = self
            .get("/storage/volumes?fields=name,uuid&max_records=10000")
            .await?;
        Ok(page.records)
    }

    async fn volume(&self, uuid: &str) -> Result<Volume> {
        let raw: serde_json::Value = self.get(&format!("/storage/volumes/{uuid}?fields=*")).await?;
        volume_from_record(raw)
    }

    async fn snapshots(&self, volume_uuid: &str) -> Result<Vec<SnapshotRecord>> {
        let page: Collection<SnapshotRecord> = self
            .get(&format!(
                "/storage/volumes/{volume_uuid}/snapshots?fields=name,uuid,comment"
            ))
            .await?;
        Ok(page.records)
    }

    async fn create_snapshot(&self, volume: &VolumeRecord, name: &str, comment: &str) -> Result<()> {
        let body = serde_json::json!({
            "name": name,
            "comment": comment,
            "volume": { "name": volume.name, "uuid": volume.uuid },
        });
        self.mutate(
            Method::POST,
            &format!("/storage/volumes/{}/snapshots", volume.uuid),
            Some(&body),
        )
        .await
    }

    async fn delete_snapshot(&self, volume_uuid: &str, snapshot_uuid: &str) -> Result<()> {
        self.mutate(
            Method::DELETE,
            &format!("/storage/volumes/{volume_uuid}/snapshots/{snapshot_uuid}"),
            None,
        )
        .await
    }

    async fn create_volume(&self, request: &CloneVolumeRequest) -> Result<()> {
        self.mutate(Method::POST, "/storage/volumes", Some(&request.to_body()))
            .await
    }

    async fn delete_volume(&self, uuid: &str, force: bool) -> Result<()> {
        self.mutate(
            Method::DELETE,
            &format!("/storage/volumes/{uuid}?force={force}"),
            None,
        )
        .await
    }

    async fn file_clone(&self, request: &FileCloneRequest) -> Result<()> {
        self.mutate(Method::POST, "/storage/file/clone", Some(&request.to_body()))
            .await
    }

    async fn cli(&self, command: &str, params: &serde_json::Value) -> Result<()> {
        self.mutate(Method::POST, &cli_path(command), Some(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_command_maps_to_private_path() {
        assert_eq!(
            cli_path("volume snapshot restore"),
            "/private/cli/volume/snapshot/restore"
        );
    }

    #[test]
    fn api_base_defaults_to_https() {
        assert_eq!(api_base("cluster1"), "https://cluster1/api");
        assert_eq!(api_base("http://sim:8080/"), "http://sim:8080/api");
    }

    #[test]
    fn volume_record_with_clone_relationship() {
        let raw = serde_json::json!({
            "name": "storageA_vol_clone",
            "uuid": "c-1",
            "svm": { "name": "svm1", "uuid": "s-1" },
            "clone": {
                "is_flexclone": true,
                "parent_volume": { "name": "storageA_vol" },
                "parent_snapshot": { "name": "proxmox_snapshot_2024-01-01_00:00:00+0000" }
            },
            "nas": { "path": "/storageA_vol_clone" }
        });
        let volume = volume_from_record(raw).unwrap();
        assert!(volume.is_flexclone());
        assert_eq!(volume.svm, "svm1");
        assert_eq!(volume.flexclone.parent_volume.as_deref(), Some("storageA_vol"));
        assert_eq!(volume.nas_path.as_deref(), Some("/storageA_vol_clone"));
    }

    #[test]
    fn volume_record_without_clone_block_is_not_a_clone() {
        let raw = serde_json::json!({ "name": "v", "uuid": "u" });
        let volume = volume_from_record(raw).unwrap();
        assert!(!volume.is_flexclone());
        assert_eq!(volume.svm, "");
    }
}
