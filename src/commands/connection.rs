// ABOUTME: Shared helper for opening the shell a deploy runs through.
// ABOUTME: Local bash when no server is configured, an SSH session otherwise.

use alembic_deploy::config::Config;
use alembic_deploy::diagnostics::{Diagnostics, Warning};
use alembic_deploy::error::Result;
use alembic_deploy::output::Output;
use alembic_deploy::shell::{LocalShell, Shell, SshShell};
use alembic_deploy::ssh::Session;

pub enum TargetShell {
    Local(LocalShell),
    Remote { host: String, shell: SshShell },
}

impl TargetShell {
    pub async fn open(config: &Config, output: &Output) -> Result<Self> {
        match &config.server {
            None => {
                output.progress("  → Running commands locally");
                Ok(TargetShell::Local(LocalShell::new()))
            }
            Some(server) => {
                output.progress(&format!("  → Connecting to {}...", server.host));
                let session = Session::connect(server.session_config()).await?;
                Ok(TargetShell::Remote {
                    host: server.host.clone(),
                    shell: SshShell::new(session),
                })
            }
        }
    }

    pub fn as_shell(&self) -> &dyn Shell {
        match self {
            TargetShell::Local(shell) => shell,
            TargetShell::Remote { shell, .. } => shell,
        }
    }

    /// Disconnect SSH sessions (non-fatal if it fails).
    pub async fn close(self, diag: &mut Diagnostics) {
        if let TargetShell::Remote { host, shell } = self
            && let Err(e) = shell.disconnect().await
        {
            diag.warn(Warning::ssh_disconnect(format!(
                "SSH disconnect failed for {}: {}",
                host, e
            )));
        }
    }
}
