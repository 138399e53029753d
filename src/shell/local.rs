// ABOUTME: Shell implementation that runs commands through the local bash.
// ABOUTME: Used when no deploy server is configured (e.g. the CI runner is the host).

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{CommandOutput, ExecError, Shell, ShellCommand};

/// Runs each command with `bash -c`, optionally from a fixed working directory.
#[derive(Debug, Clone, Default)]
pub struct LocalShell {
    working_dir: Option<PathBuf>,
}

impl LocalShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl Shell for LocalShell {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, ExecError> {
        let mut process = Command::new("bash");
        process
            .arg("-c")
            .arg(command.script())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.working_dir {
            process.current_dir(dir);
        }

        let output = process.output().await?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
