// ABOUTME: Deploy error types with the SNAFU pattern.
// ABOUTME: Wraps version-query, execution, and marker-write failures with the target.

use snafu::Snafu;

use crate::marker::MarkerError;
use crate::probe::ProbeError;
use crate::shell::ExecError;
use crate::types::DeployTarget;

/// A fatal deploy failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeployError {
    /// Migration state could not be determined; nothing was run.
    #[snafu(display("cannot determine migration state for {target}: {source}"))]
    VersionQuery {
        target: DeployTarget,
        source: ProbeError,
    },

    /// A command in the plan failed; the target may be half-deployed.
    #[snafu(display("deploy to {target} failed: {source}"))]
    Execution {
        target: DeployTarget,
        source: ExecError,
    },

    /// The deploy succeeded but the new version marker was not saved.
    #[snafu(display("deployed to {target} but failed to record the version: {source}"))]
    MarkerWrite {
        target: DeployTarget,
        source: MarkerError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    VersionQuery,
    Execution,
    MarkerWrite,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::VersionQuery { .. } => DeployErrorKind::VersionQuery,
            DeployError::Execution { .. } => DeployErrorKind::Execution,
            DeployError::MarkerWrite { .. } => DeployErrorKind::MarkerWrite,
        }
    }

    pub fn target(&self) -> DeployTarget {
        match self {
            DeployError::VersionQuery { target, .. }
            | DeployError::Execution { target, .. }
            | DeployError::MarkerWrite { target, .. } => *target,
        }
    }

    /// Zero-based index of the plan command that failed, for execution failures.
    pub fn failed_command(&self) -> Option<usize> {
        match self {
            DeployError::Execution {
                source: ExecError::CommandFailed { index, .. },
                ..
            } => Some(*index),
            _ => None,
        }
    }
}
