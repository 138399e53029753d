// ABOUTME: SSH client for running deploy commands on the target host.
// ABOUTME: Authenticates with an explicit key, the SSH agent, or default key files.

mod client;
mod error;

pub use client::{Session, SessionConfig};
pub use error::{Error, Result};
