//! Compute-node task watch.
//!
//! Tracks one asynchronous VM action until its task reports the expected
//! terminal status:
//! ```text
//! Pending ──Polled(expected)──────────► Settled
//!    │    ──Polled(stopped, OK)───────► Settled
//!    │    ──Polled(stopped, not OK)───► Failed
//!    └──DeadlineElapsed──► Expired
//! ```
//! A task that has finished reports `stopped` from then on, whatever the VM
//! itself is doing; its exit status tells success from failure.
//! The caller owns the polling loop and feeds every observed status in.

use statig::prelude::*;
use tracing::debug;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Task status once the task has ended, successfully or not.
pub const TASK_STOPPED: &str = "stopped";
/// Exit status of a task that succeeded.
pub const EXIT_OK: &str = "OK";

#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// One status poll returned these values.
    Polled {
        status: String,
        exitstatus: Option<String>,
    },
    /// The caller's deadline passed before the task settled.
    DeadlineElapsed,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

pub struct TaskWatch {
    pub expected: String,
}

impl TaskWatch {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::pending()",
    state(derive(Debug, Clone, PartialEq))
)]
impl TaskWatch {
    /// Task still running (or not yet in the expected state).
    #[state]
    fn pending(&mut self, event: &TaskEvent) -> Outcome<State> {
        match event {
            TaskEvent::Polled { status, exitstatus } => {
                let finished = status == TASK_STOPPED;
                match exitstatus.as_deref() {
                    Some(code) if finished && code != EXIT_OK => {
                        debug!(exitstatus = code, "task failed");
                        Transition(State::failed())
                    }
                    _ if *status == self.expected => {
                        debug!(status = %status, "task settled");
                        Transition(State::settled())
                    }
                    Some(_) if finished => {
                        debug!("task finished");
                        Transition(State::settled())
                    }
                    _ => Handled,
                }
            }
            TaskEvent::DeadlineElapsed => Transition(State::expired()),
        }
    }

    /// Terminal: expected status observed.
    #[state]
    fn settled(&mut self, event: &TaskEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }

    /// Terminal: the task ended with an error exit status.
    #[state]
    fn failed(&mut self, event: &TaskEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }

    /// Terminal: gave up waiting.
    #[state]
    fn expired(&mut self, event: &TaskEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }
}
