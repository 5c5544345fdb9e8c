//! Per-user directory layout for pve-ontap-snapshot.
//!
//! - Config: `~/.config/pve-ontap-snapshot/`  (XDG-style everywhere)
//! - Logs:   `~/Library/Logs/pve-ontap-snapshot/` on macOS,
//!           `~/.local/share/pve-ontap-snapshot/logs/` elsewhere
//!
//! Nothing here creates directories except [`ToolPaths::ensure_logs`].

use std::path::{Path, PathBuf};

const APP_NAME: &str = "pve-ontap-snapshot";

/// File name looked up in the working directory and in the config dir.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved per-user directories.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub config: PathBuf,
    pub logs: PathBuf,
}

impl ToolPaths {
    /// Resolve paths from `$HOME`. Returns `None` when `HOME` is unset.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        Some(Self {
            config: resolve_config_dir(&home),
            logs: resolve_log_dir(&home),
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE)
    }

    pub fn ensure_logs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.logs)
    }
}

/// Pick the config file used when `--config` is not given: `./config.toml`
/// if it exists, otherwise the per-user one (which may not exist; loading
/// reports that).
pub fn default_config_file() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    ToolPaths::resolve()
        .map(|p| p.config_file())
        .unwrap_or(local)
}

fn resolve_config_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_log_dir(home: &Path) -> PathBuf {
    home.join("Library").join("Logs").join(APP_NAME)
}

#[cfg(not(target_os = "macos"))]
fn resolve_log_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME).join("logs")
    } else {
        home.join(".local").join("share").join(APP_NAME).join("logs")
    }
}
