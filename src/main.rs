//! pve-ontap-snapshot: NetApp ONTAP snapshots for Proxmox VE
//!
//! Parses the command line, logs into the Proxmox API, and runs one
//! operation on a VM or a storage backend. Results go to stdout, logs to
//! stderr.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use pve_ontap_snapshot::cli::Args;
use pve_ontap_snapshot::config::Config;
use pve_ontap_snapshot::context::Clients;
use pve_ontap_snapshot::logging;
use pve_ontap_snapshot::ontap::RestConnector;
use pve_ontap_snapshot::ops;
use pve_ontap_snapshot::paths::default_config_file;
use pve_ontap_snapshot::proxmox::ProxmoxClient;

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = logging::init(args.loglevel);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_file);
    debug!(path = %config_path.display(), "loading settings");
    let config = Config::load(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;

    // Every API call is awaited in sequence; one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let operation = args.operation();
    let policy = args.poll_policy();

    let lines = runtime.block_on(async {
        let access = config.proxmox_access()?;
        let compute = ProxmoxClient::login(&access)
            .await
            .with_context(|| format!("logging into Proxmox at {}", access.host))?;
        let controller = RestConnector;
        let clients = Clients::new(&compute, &controller, &config);
        let lines = ops::dispatch(clients, operation, &policy).await?;
        anyhow::Ok(lines)
    })?;

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
