// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "alembic-deploy")]
#[command(about = "Redeploy a docker stack, restoring the database when migrations diverged")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory to search for alembic-deploy.yml (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template alembic-deploy.yml
    Init {
        /// Project name used in reports
        #[arg(short, long)]
        project: Option<String>,

        /// Backend image repository
        #[arg(short, long)]
        image: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy the image tagged $TAG to a target
    Deploy {
        /// Target environment (stag or prod)
        target: String,

        /// Override the image repository from config
        #[arg(short, long)]
        image: Option<String>,
    },

    /// Show what a deploy would do without running it
    Plan {
        /// Target environment (stag or prod)
        target: String,

        /// Override the image repository from config
        #[arg(short, long)]
        image: Option<String>,
    },

    /// Show the last recorded deploy for a target
    Status {
        /// Target environment (stag or prod)
        target: String,
    },
}
