// ABOUTME: Shell implementation backed by an SSH session to the deploy server.
// ABOUTME: Commands run without a timeout, matching the local shell.

use async_trait::async_trait;

use super::{CommandOutput, ExecError, Shell, ShellCommand};
use crate::ssh::Session;

#[derive(Debug)]
pub struct SshShell {
    session: Session,
}

impl SshShell {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Close the underlying session.
    pub async fn disconnect(self) -> crate::ssh::Result<()> {
        self.session.disconnect().await
    }
}

#[async_trait]
impl Shell for SshShell {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, ExecError> {
        self.session
            .exec(command.script())
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))
    }
}
