// ABOUTME: Deploy orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, and the orchestrator.

mod deployment;
mod error;
mod orchestrator;
mod state;
mod transitions;

pub use deployment::{DeployOutcome, Deployment};
pub use error::{DeployError, DeployErrorKind};
pub use orchestrator::{Orchestrator, format_elapsed};
pub use state::{Executed, Planned, Recorded};
