// ABOUTME: Command execution: the Shell seam, local and SSH shells, and the sequence executor.
// ABOUTME: Sequences run strictly in order and stop at the first failing command.

mod command;
mod local;
mod remote;

pub use command::{ShellCommand, shell_quote};
pub use local::LocalShell;
pub use remote::SshShell;

use async_trait::async_trait;

/// Output from one command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, or None when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run a shell command line and capture its output.
#[async_trait]
pub trait Shell: Send + Sync {
    /// Run one command. A non-zero exit is reported in the output, not as an error.
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, ExecError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn shell: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("remote shell error: {0}")]
    Transport(String),

    #[error(
        "command {} failed with exit code {}: {}{}",
        .index + 1,
        display_code(.exit_code),
        .command,
        display_stderr(.stderr)
    )]
    CommandFailed {
        index: usize,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (killed by signal)".to_string())
}

fn display_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}

/// Run `commands` in order on `shell`, stopping at the first failure.
///
/// Best-effort commands may fail without stopping the sequence. There is no
/// timeout: a hung command blocks until it returns.
pub async fn run_commands(
    shell: &(impl Shell + ?Sized),
    commands: &[ShellCommand],
) -> Result<(), ExecError> {
    for (index, command) in commands.iter().enumerate() {
        tracing::debug!("[{}/{}] {}", index + 1, commands.len(), command);

        let output = shell.run(command).await?;
        if output.success() {
            continue;
        }

        if command.is_best_effort() {
            tracing::warn!(
                "Ignoring failure of best-effort command (exit code {}): {}",
                display_code(&output.exit_code),
                command
            );
            continue;
        }

        return Err(ExecError::CommandFailed {
            index,
            command: command.redacted(),
            exit_code: output.exit_code,
            stderr: output.stderr,
        });
    }
    Ok(())
}
