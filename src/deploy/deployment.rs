// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Carries the target, the gathered inputs, and the immutable plan through each state.

use std::time::Duration;

use crate::config::DeployInputs;
use crate::marker::VersionMarker;
use crate::plan::{Decision, DeployPlan};
use crate::types::DeployTarget;

use super::state::{Executed, Planned, Recorded};

/// A deploy in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) target: DeployTarget,
    pub(crate) inputs: DeployInputs,
    pub(crate) plan: DeployPlan,
    pub(crate) state: S,
}

impl Deployment<Planned> {
    pub fn new(target: DeployTarget, inputs: DeployInputs, plan: DeployPlan) -> Self {
        Deployment {
            target,
            inputs,
            plan,
            state: Planned,
        }
    }
}

impl<S> Deployment<S> {
    pub fn target(&self) -> DeployTarget {
        self.target
    }

    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }
}

impl Deployment<Executed> {
    /// Wall-clock time the command sequence took.
    pub fn elapsed(&self) -> Duration {
        self.state.elapsed
    }
}

impl Deployment<Recorded> {
    pub fn finish(self) -> DeployOutcome {
        DeployOutcome {
            target: self.target,
            decision: self.plan.decision(),
            elapsed: self.state.elapsed,
            marker: self.state.marker,
        }
    }
}

/// Summary of a successful deploy.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub target: DeployTarget,
    pub decision: Decision,
    pub elapsed: Duration,
    pub marker: VersionMarker,
}
