// ABOUTME: State transition methods for a deploy.
// ABOUTME: Each method consumes self and returns the next state on success.

use snafu::ResultExt;
use std::time::Instant;

use crate::marker::{MarkerStore, VersionMarker};
use crate::shell::{Shell, ShellCommand, run_commands};

use super::Deployment;
use super::error::{DeployError, ExecutionSnafu, MarkerWriteSnafu};
use super::state::{Executed, Planned, Recorded};

impl Deployment<Planned> {
    /// Run the plan's commands in order and time them.
    ///
    /// Blocks until the last command returns; there is no timeout.
    pub async fn execute(
        self,
        shell: &(impl Shell + ?Sized),
    ) -> Result<Deployment<Executed>, DeployError> {
        let commands: Vec<ShellCommand> = self.plan.commands().iter().cloned().collect();
        tracing::info!(
            "Running {} command(s) against {}",
            commands.len(),
            self.target
        );

        let start = Instant::now();
        let result = run_commands(shell, &commands).await;
        let elapsed = start.elapsed();

        if let Err(ref e) = result {
            tracing::error!("Deploy to {} aborted after {:?}: {}", self.target, elapsed, e);
        }
        result.context(ExecutionSnafu {
            target: self.target,
        })?;

        Ok(Deployment {
            target: self.target,
            inputs: self.inputs,
            plan: self.plan,
            state: Executed { elapsed },
        })
    }
}

impl Deployment<Executed> {
    /// Persist the deployed tag and branch as the target's new version marker.
    pub fn record(
        self,
        store: &(impl MarkerStore + ?Sized),
    ) -> Result<Deployment<Recorded>, DeployError> {
        let marker = VersionMarker::new(self.inputs.tag.clone(), self.inputs.branch.clone());
        store.save(self.target, &marker).context(MarkerWriteSnafu {
            target: self.target,
        })?;
        tracing::debug!("Recorded {} as deployed to {}", marker.tag, self.target);

        Ok(Deployment {
            target: self.target,
            inputs: self.inputs,
            plan: self.plan,
            state: Recorded {
                elapsed: self.state.elapsed,
                marker,
            },
        })
    }
}
