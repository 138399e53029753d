// ABOUTME: Plan command implementation.
// ABOUTME: Probes migration state and prints the decision and commands without running them.

use super::connection::TargetShell;
use alembic_deploy::config::{Config, DeployInputs};
use alembic_deploy::deploy::Orchestrator;
use alembic_deploy::diagnostics::Diagnostics;
use alembic_deploy::error::Result;
use alembic_deploy::marker::FileMarkerStore;
use alembic_deploy::migrate::DeferredMigrations;
use alembic_deploy::output::Output;
use alembic_deploy::probe::AlembicProbe;
use alembic_deploy::report::LogReporter;
use alembic_deploy::types::DeployTarget;
use std::sync::Arc;

pub async fn plan(config: Config, target: DeployTarget, output: Output) -> Result<()> {
    let inputs = DeployInputs::gather_for_plan(&config)?;
    let mut diag = Diagnostics::default();

    let shell = TargetShell::open(&config, &output).await?;
    let probe = AlembicProbe::new(shell.as_shell(), &config.database);
    let store = FileMarkerStore::new(config.marker_dir(), &config.project);

    let orchestrator = Orchestrator::new(
        &config,
        &probe,
        shell.as_shell(),
        &store,
        Arc::new(LogReporter),
        &DeferredMigrations,
    );
    let result = orchestrator.plan(target, &inputs, &mut diag).await;

    shell.close(&mut diag).await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let deployment = result?;
    output.info(&deployment.plan().to_string());
    Ok(())
}
