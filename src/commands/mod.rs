// ABOUTME: Command module aggregator for the alembic-deploy CLI.
// ABOUTME: Re-exports deploy, plan, and status command handlers.

mod connection;
mod deploy;
mod plan;
mod status;

pub use deploy::deploy;
pub use plan::plan;
pub use status::status;
