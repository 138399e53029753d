// ABOUTME: Drives one deploy end to end: probe, decide, report, execute, record.
// ABOUTME: Reports run concurrently with execution and are drained before returning.

use snafu::ResultExt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DeployInputs};
use crate::diagnostics::{Diagnostics, Warning};
use crate::marker::{MarkerStore, VersionMarker};
use crate::migrate::MigrationTrigger;
use crate::plan::DeployPlan;
use crate::probe::{self, VersionSource};
use crate::report::{ReportSet, Reporter};
use crate::shell::Shell;
use crate::types::DeployTarget;

use super::error::{DeployError, VersionQuerySnafu};
use super::state::Planned;
use super::{DeployOutcome, Deployment};

/// The collaborators a deploy needs, borrowed for the length of one invocation.
pub struct Orchestrator<'a> {
    config: &'a Config,
    source: &'a dyn VersionSource,
    shell: &'a dyn Shell,
    store: &'a dyn MarkerStore,
    reporter: Arc<dyn Reporter>,
    migrations: &'a dyn MigrationTrigger,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn VersionSource,
        shell: &'a dyn Shell,
        store: &'a dyn MarkerStore,
        reporter: Arc<dyn Reporter>,
        migrations: &'a dyn MigrationTrigger,
    ) -> Self {
        Self {
            config,
            source,
            shell,
            store,
            reporter,
            migrations,
        }
    }

    /// Probe migration state and decide how to deploy, without running anything.
    pub async fn plan(
        &self,
        target: DeployTarget,
        inputs: &DeployInputs,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<Planned>, DeployError> {
        let versions = probe::version_state(self.source, &self.config.image, &inputs.tag, target)
            .await
            .context(VersionQuerySnafu { target })?;

        // Only consulted once the version query has succeeded.
        let previous = self.last_deployed(target, diag);

        let plan = DeployPlan::build(
            self.config,
            target,
            inputs,
            previous.as_ref().map(|m| &m.tag),
            &versions,
        );
        tracing::info!("{}", plan.message());

        Ok(Deployment::new(target, inputs.clone(), plan))
    }

    /// Run a full deploy.
    ///
    /// The marker is written only after every command succeeds. Outstanding
    /// reports are awaited on every exit path once execution has started;
    /// delivery failures end up in `diag`, never in the result.
    pub async fn deploy(
        &self,
        target: DeployTarget,
        inputs: &DeployInputs,
        diag: &mut Diagnostics,
    ) -> Result<DeployOutcome, DeployError> {
        let deployment = self.plan(target, inputs, diag).await?;
        let mut reports = ReportSet::new(Arc::clone(&self.reporter), self.config.report_timeout);

        reports.spawn(self.report_line(&format!(
            "{}. {} Target branch: {}.",
            target,
            deployment.plan().message(),
            inputs.branch_or_unknown()
        )));

        let executed = match deployment.execute(self.shell).await {
            Ok(executed) => executed,
            Err(e) => {
                drain(&mut reports, diag).await;
                return Err(e);
            }
        };

        reports.spawn(self.report_line(&format!(
            "{}. Deploy successful. Approximate downtime: {}",
            target,
            format_elapsed(executed.elapsed())
        )));

        let recorded = match executed.record(self.store) {
            Ok(recorded) => recorded,
            Err(e) => {
                drain(&mut reports, diag).await;
                return Err(e);
            }
        };

        if recorded.plan().needs_migration() {
            self.migrations.trigger(target).await;
        }

        drain(&mut reports, diag).await;
        Ok(recorded.finish())
    }

    fn report_line(&self, body: &str) -> String {
        format!("[{}] {}", self.config.project, body)
    }

    fn last_deployed(&self, target: DeployTarget, diag: &mut Diagnostics) -> Option<VersionMarker> {
        match self.store.load(target) {
            Ok(Some(marker)) => {
                tracing::debug!(
                    "{} last deployed {} by {} at {}",
                    target,
                    marker.tag,
                    marker.deployed_by,
                    marker.deployed_at
                );
                Some(marker)
            }
            Ok(None) => {
                tracing::info!("No deploy recorded for {} yet", target);
                None
            }
            Err(e) => {
                diag.warn(Warning::marker_unreadable(format!(
                    "Ignoring version marker for {}: {}",
                    target, e
                )));
                None
            }
        }
    }
}

async fn drain(reports: &mut ReportSet, diag: &mut Diagnostics) {
    for failure in reports.join().await {
        diag.warn(Warning::report_delivery(format!(
            "Report not delivered: {}",
            failure
        )));
    }
}

/// Render a duration the way the deploy report shows it: `4.2s`, `1m3.0s`, `1h0m12.5s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = elapsed.as_secs() / 3600;
    let minutes = (elapsed.as_secs() % 3600) / 60;
    let seconds = total - (hours * 3600 + minutes * 60) as f64;

    if hours > 0 {
        format!("{}h{}m{:.1}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{:.1}s", minutes, seconds)
    } else {
        format!("{:.1}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(4_200)), "4.2s");
        assert_eq!(format_elapsed(Duration::ZERO), "0.0s");
    }

    #[test]
    fn formats_minutes() {
        assert_eq!(format_elapsed(Duration::from_secs(63)), "1m3.0s");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_elapsed(Duration::from_millis(3_612_500)), "1h0m12.5s");
    }
}
