// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection, authentication, host key, and channel failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection to {host}:{port} failed: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("authentication as {0} failed: no key was accepted")]
    AuthenticationFailed(String),

    #[error("no usable credentials: {0}")]
    NoCredentials(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("failed to run remote command: {0}")]
    Channel(String),

    #[error("channel closed before the command reported an exit status")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
