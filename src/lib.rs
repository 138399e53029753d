// ABOUTME: Library root for alembic-deploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod marker;
pub mod migrate;
pub mod output;
pub mod plan;
pub mod probe;
pub mod report;
pub mod shell;
pub mod ssh;
pub mod types;
