// ABOUTME: Deployment state markers for the type state pattern.
// ABOUTME: The marker can only be recorded once the plan has executed successfully.

use std::time::Duration;

use crate::marker::VersionMarker;

/// Planned: decision made, commands built, nothing run yet.
/// Available actions: `execute()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Executed: every command in the plan succeeded.
/// Available actions: `record()`
#[derive(Debug, Clone, Copy)]
pub struct Executed {
    pub(crate) elapsed: Duration,
}

/// Recorded: the new version marker is persisted.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Recorded {
    pub(crate) elapsed: Duration,
    pub(crate) marker: VersionMarker,
}
