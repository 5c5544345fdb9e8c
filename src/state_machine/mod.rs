//! `statig` state machines.

pub mod task_watch_sm;
