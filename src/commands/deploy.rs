// ABOUTME: Deploy command implementation.
// ABOUTME: Wires config, shell, probe, marker store, and reporter into the orchestrator.

use super::connection::TargetShell;
use alembic_deploy::config::{Config, DeployInputs};
use alembic_deploy::deploy::{Orchestrator, format_elapsed};
use alembic_deploy::diagnostics::Diagnostics;
use alembic_deploy::error::Result;
use alembic_deploy::marker::FileMarkerStore;
use alembic_deploy::migrate::DeferredMigrations;
use alembic_deploy::output::Output;
use alembic_deploy::probe::AlembicProbe;
use alembic_deploy::report::HookReporter;
use alembic_deploy::types::DeployTarget;

/// Deploy the candidate named by $TAG to `target`.
pub async fn deploy(config: Config, target: DeployTarget, mut output: Output) -> Result<()> {
    output.start_timer();
    let inputs = DeployInputs::gather(&config)?;
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} ({}:{}) to {}",
        config.project,
        config.image,
        inputs.tag,
        target
    ));

    let shell = TargetShell::open(&config, &output).await?;
    let probe = AlembicProbe::new(shell.as_shell(), &config.database);
    let store = FileMarkerStore::new(config.marker_dir(), &config.project);
    let reporter = HookReporter::or_log(&config.report_hook(), &config.project, target);

    output.progress("  → Checking migration state...");
    let orchestrator = Orchestrator::new(
        &config,
        &probe,
        shell.as_shell(),
        &store,
        reporter,
        &DeferredMigrations,
    );
    let result = orchestrator.deploy(target, &inputs, &mut diag).await;

    shell.close(&mut diag).await;

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let outcome = result?;
    output.progress(&format!("  ✓ {}", outcome.decision.message()));
    output.success(&format!(
        "Deployed {} to {} (downtime {})",
        outcome.marker.tag,
        target,
        format_elapsed(outcome.elapsed)
    ));
    Ok(())
}
