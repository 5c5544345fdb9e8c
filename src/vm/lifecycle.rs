//! VM power transitions via the Proxmox task API.
//!
//! ## Architecture
//!
//! ```text
//! shutdown() / suspend() / start()
//!     └─► POST /nodes/<node>/qemu/<vmid>/status/<action>  →  UPID
//!             └─► wait_for_task  (polls GET /nodes/<node>/tasks/<UPID>/status
//!                                 every `interval` until the expected status
//!                                 or the optional deadline)
//!                     └─► GET status/current  →  VmContext::status
//! ```
//!
//! A failed request or task aborts the transition, and so does a VM that is
//! not in the target state afterwards; the caller never proceeds with a VM in
//! an unknown power state.

use std::time::Duration;

use statig::prelude::*;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{STATUS_RUNNING, STATUS_STOPPED, VmContext};
use crate::error::{Result, SnapshotError};
use crate::ontap::OntapConnector;
use crate::proxmox::{ComputeApi, PowerAction, Upid};
use crate::state_machine::task_watch_sm::{State, TaskEvent, TaskWatch};

/// How long to wait between task polls and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits for as long as the task runs.
    pub deadline: Option<Instant>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// One-second polling, bounded by `timeout` from now when given.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            deadline: timeout.map(|t| Instant::now() + t),
            ..Self::default()
        }
    }
}

/// Poll `upid` until its status equals `expected` or the task has finished.
/// Returns the number of polls it took.
///
/// A task that finished with an exit status other than `OK` is a
/// `ComputeNode` error.
pub async fn wait_for_task<P: ComputeApi>(
    api: &P,
    node: &str,
    upid: &Upid,
    expected: &str,
    policy: &PollPolicy,
) -> Result<u32> {
    let mut watch = TaskWatch::new(expected).state_machine();
    let mut polls = 0;
    loop {
        let status = api.task_status(node, upid).await?;
        polls += 1;
        debug!(
            upid = %upid,
            status = %status.status,
            exitstatus = status.exitstatus.as_deref().unwrap_or("-"),
            polls,
            "task status"
        );
        let exitstatus = status.exitstatus.clone();
        watch.handle(&TaskEvent::Polled {
            status: status.status,
            exitstatus: status.exitstatus,
        });

        if let Some(deadline) = policy.deadline {
            if Instant::now() >= deadline {
                watch.handle(&TaskEvent::DeadlineElapsed);
            }
        }

        match watch.state() {
            State::Settled {} => return Ok(polls),
            State::Failed {} => {
                return Err(SnapshotError::compute(format!(
                    "task {upid} failed: {}",
                    exitstatus.unwrap_or_default()
                )));
            }
            State::Expired {} => {
                return Err(SnapshotError::Timeout {
                    task: upid.to_string(),
                    expected: expected.to_string(),
                });
            }
            State::Pending {} => tokio::time::sleep(policy.interval).await,
        }
    }
}

impl<P: ComputeApi, O: OntapConnector> VmContext<'_, P, O> {
    /// Graceful guest shutdown.
    pub async fn shutdown(&mut self, policy: &PollPolicy) -> Result<()> {
        self.transition(PowerAction::Shutdown, STATUS_STOPPED, "shutting down", policy)
            .await
    }

    /// Hibernate: memory state is written to disk.
    pub async fn suspend(&mut self, policy: &PollPolicy) -> Result<()> {
        self.transition(
            PowerAction::Suspend { to_disk: true },
            STATUS_STOPPED,
            "suspending",
            policy,
        )
        .await
    }

    pub async fn start(&mut self, policy: &PollPolicy) -> Result<()> {
        self.transition(PowerAction::Start, STATUS_RUNNING, "starting", policy)
            .await
    }

    async fn transition(
        &mut self,
        action: PowerAction,
        expected: &str,
        verb: &str,
        policy: &PollPolicy,
    ) -> Result<()> {
        info!(vmid = self.id, name = %self.name, "{verb} vm...");
        let compute = self.clients().compute;
        let upid = compute.vm_action(&self.node, self.id, action).await?;
        debug!(upid = %upid, "task started");

        wait_for_task(compute, &self.node, &upid, expected, policy).await?;
        self.status = compute.vm_status(&self.node, self.id).await?.status;
        if self.status != expected {
            return Err(SnapshotError::compute(format!(
                "VM {} is {} after {verb}, expected {expected}",
                self.id, self.status
            )));
        }
        info!(vmid = self.id, status = %self.status, "...done");
        Ok(())
    }
}
