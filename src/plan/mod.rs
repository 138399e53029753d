// ABOUTME: Deploy planning: the decision engine plus the command builder.
// ABOUTME: A DeployPlan is built once per invocation and consumed by the orchestrator.

mod commands;
mod decision;

pub use commands::CommandBuilder;
pub use decision::{Decision, DeployKind, VersionState, decide};

use nonempty::NonEmpty;
use std::fmt;

use crate::config::{Config, DeployInputs};
use crate::shell::ShellCommand;
use crate::types::{DeployTarget, ImageTag};

/// What to run for one deploy, and why.
///
/// `commands` is never empty and always ends with the stack deploy command.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    decision: Decision,
    commands: NonEmpty<ShellCommand>,
}

impl DeployPlan {
    /// Decide and build the command sequence for `target`.
    pub fn build(
        config: &Config,
        target: DeployTarget,
        inputs: &DeployInputs,
        current_tag: Option<&ImageTag>,
        versions: &VersionState,
    ) -> Self {
        let decision = decide(current_tag, &inputs.tag, target, versions);
        let builder = CommandBuilder::new(config, target);
        let deploy = builder.deploy_command(&inputs.registry);

        Self {
            decision,
            commands: builder.sequence(decision.kind(), deploy),
        }
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn message(&self) -> &'static str {
        self.decision.message()
    }

    pub fn kind(&self) -> DeployKind {
        self.decision.kind()
    }

    pub fn needs_migration(&self) -> bool {
        self.decision.needs_migration()
    }

    pub fn commands(&self) -> &NonEmpty<ShellCommand> {
        &self.commands
    }

    /// The trailing command that ships the new image.
    pub fn deploy_command(&self) -> &ShellCommand {
        self.commands.last()
    }
}

impl fmt::Display for DeployPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message())?;
        writeln!(f, "Needs migration: {}", self.needs_migration())?;
        for (i, command) in self.commands.iter().enumerate() {
            writeln!(f, "  {:>2}. {}", i + 1, command)?;
        }
        Ok(())
    }
}
