//! What the VM and Storage entities share.

use crate::config::{AccessBundle, Config};
use crate::error::Result;

/// Borrowed handles to both external APIs and the parsed settings.
///
/// Built once per invocation and passed into every entity constructor.
pub struct Clients<'a, P, O> {
    pub compute: &'a P,
    pub controller: &'a O,
    pub config: &'a Config,
}

impl<'a, P, O> Clients<'a, P, O> {
    pub fn new(compute: &'a P, controller: &'a O, config: &'a Config) -> Self {
        Self {
            compute,
            controller,
            config,
        }
    }
}

impl<P, O> Clone for Clients<'_, P, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, O> Copy for Clients<'_, P, O> {}

/// Capability common to [`crate::vm::VmContext`] and
/// [`crate::storage::StorageContext`].
pub trait Entity {
    /// Credentials for the controller behind a storage backend.
    fn resolve_access(&self, backend: &str) -> Result<AccessBundle>;

    /// Multi-line human-readable summary, logged at debug level.
    fn describe(&self) -> String;
}
