//! Volume lookup by name.
//!
//! Every call opens a fresh session and enumerates the whole volume
//! collection; nothing is cached between calls.

use tracing::debug;

use crate::config::AccessBundle;
use crate::error::{Result, SnapshotError};
use crate::ontap::{OntapConnector, OntapSession, Volume};

/// First volume whose name matches exactly, re-fetched with full detail.
pub async fn get_volume<C: OntapConnector>(
    connector: &C,
    name: &str,
    access: &AccessBundle,
) -> Result<Option<Volume>> {
    debug!(volume = name, host = %access.host, "looking up volume");
    let session = connector.connect(access)?;
    let records = session.volumes().await?;
    match records.into_iter().find(|record| record.name == name) {
        Some(record) => session.volume(&record.uuid).await.map(Some),
        None => Ok(None),
    }
}

/// Like [`get_volume`] but absence is an error.
pub async fn require_volume<C: OntapConnector>(
    connector: &C,
    name: &str,
    access: &AccessBundle,
) -> Result<Volume> {
    get_volume(connector, name, access)
        .await?
        .ok_or_else(|| SnapshotError::VolumeNotFound {
            volume: name.to_string(),
        })
}
