//! Settings file and access resolution.
//!
//! The settings file is TOML with one table per endpoint:
//!
//! ```toml
//! [proxmox]
//! host = "pve1.example.com:8006"
//! user = "root@pam"
//! password = "secret"
//! verify = false
//!
//! [nfs_datastore]          # one table per Proxmox storage backend
//! host = "cluster1.example.com"
//! user = "admin"
//! password = "secret"
//! verify = "True"
//! ```
//!
//! A FlexClone backend (`<backend>-CLONE`) has no table of its own: it is
//! resolved through its parent's table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SnapshotError};
use crate::naming::CLONE_SUFFIX;

/// Name of the compute-node table.
pub const PROXMOX_SECTION: &str = "proxmox";

/// Credentials and endpoint for one API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessBundle {
    pub host: String,
    pub user: String,
    pub password: String,
    pub verify: bool,
}

impl fmt::Debug for AccessBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessBundle")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("verify", &self.verify)
            .finish()
    }
}

/// `verify` may be written as a TOML boolean or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn as_bool(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

/// Keys of one table. The `proxmox_*` spellings are accepted so existing
/// `[proxmox]` settings can be carried over unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
struct Section {
    #[serde(alias = "proxmox_host")]
    host: Option<String>,
    #[serde(alias = "proxmox_user")]
    user: Option<String>,
    #[serde(alias = "pass", alias = "proxmox_pass")]
    password: Option<String>,
    #[serde(alias = "proxmox_verify")]
    verify: Option<Flag>,
}

/// Parsed settings file. Constructed once in `main` and passed down.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, Section>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SnapshotError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
            .map_err(|e| SnapshotError::config(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let sections = toml::from_str(text)?;
        Ok(Self { sections })
    }

    pub fn proxmox_access(&self) -> Result<AccessBundle> {
        self.section_access(PROXMOX_SECTION)
    }

    /// Access Resolver: credentials for the controller behind `backend`.
    pub fn resolve_access(&self, backend: &str) -> Result<AccessBundle> {
        self.section_access(access_key(backend))
    }

    fn section_access(&self, key: &str) -> Result<AccessBundle> {
        let section = self
            .sections
            .get(key)
            .ok_or_else(|| SnapshotError::config(format!("missing section [{key}]")))?;
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| SnapshotError::config(format!("missing key `{name}` in [{key}]")))
        };
        Ok(AccessBundle {
            host: required(&section.host, "host")?,
            user: required(&section.user, "user")?,
            password: required(&section.password, "password")?,
            verify: section
                .verify
                .as_ref()
                .map(Flag::as_bool)
                .ok_or_else(|| SnapshotError::config(format!("missing key `verify` in [{key}]")))?,
        })
    }
}

/// Configuration lookup key for a storage backend: a clone shares its
/// parent's credentials.
pub fn access_key(backend: &str) -> &str {
    backend.strip_suffix(CLONE_SUFFIX).unwrap_or(backend)
}
