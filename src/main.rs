// ABOUTME: Entry point for the alembic-deploy CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use alembic_deploy::config::{self, Config};
use alembic_deploy::error::{Error, Result};
use alembic_deploy::output::{Output, OutputMode};
use alembic_deploy::types::{DeployTarget, ImageRef};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose/quiet flags
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet || cli.json {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("alembic_deploy=info,warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let output = Output::new(mode);

    match cli.command {
        Commands::Init {
            project,
            image,
            force,
        } => {
            config::init_config(&dir, project.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Created {}", dir.join(config::CONFIG_FILENAME).display()));
            Ok(())
        }
        Commands::Deploy { target, image } => {
            let config = load_config(&dir, image.as_deref())?;
            commands::deploy(config, parse_target(&target)?, output).await
        }
        Commands::Plan { target, image } => {
            let config = load_config(&dir, image.as_deref())?;
            commands::plan(config, parse_target(&target)?, output).await
        }
        Commands::Status { target } => {
            let config = load_config(&dir, None)?;
            commands::status(config, parse_target(&target)?, output)
        }
    }
}

fn load_config(dir: &Path, image: Option<&str>) -> Result<Config> {
    let config = Config::discover(dir)?;

    // Apply image override if specified
    match image {
        Some(image) => {
            let image = ImageRef::parse(image).map_err(|e| Error::InvalidInput(e.to_string()))?;
            Ok(config.with_image(image))
        }
        None => Ok(config),
    }
}

fn parse_target(target: &str) -> Result<DeployTarget> {
    target
        .parse()
        .map_err(|e: alembic_deploy::types::UnknownTarget| Error::InvalidInput(e.to_string()))
}
