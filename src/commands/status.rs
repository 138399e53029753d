// ABOUTME: Status command implementation.
// ABOUTME: Prints the last version marker recorded for a target.

use alembic_deploy::config::Config;
use alembic_deploy::error::Result;
use alembic_deploy::marker::{FileMarkerStore, MarkerError, MarkerStore};
use alembic_deploy::output::{Output, OutputMode};
use alembic_deploy::types::DeployTarget;

pub fn status(config: Config, target: DeployTarget, output: Output) -> Result<()> {
    let store = FileMarkerStore::new(config.marker_dir(), &config.project);

    let Some(marker) = store.load(target)? else {
        output.success(&format!("No deploy recorded for {} on {}", config.project, target));
        return Ok(());
    };

    if output.mode() == OutputMode::Json {
        let json = serde_json::to_string(&marker).map_err(MarkerError::from)?;
        println!("{json}");
        return Ok(());
    }

    output.info(&format!(
        "Project:  {}\nTarget:   {}\nTag:      {}\nBranch:   {}\nDeployed: {} by {}\n",
        config.project,
        target,
        marker.tag,
        marker.branch.as_deref().unwrap_or("unknown"),
        marker.deployed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        marker.deployed_by
    ));
    Ok(())
}
