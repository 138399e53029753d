// ABOUTME: Reporter that hands each message to a user-provided hook script.
// ABOUTME: The script reads DEPLOY_REPORT_MESSAGE, DEPLOY_TARGET, and DEPLOY_PROJECT.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use super::{LogReporter, ReportError, Reporter};
use crate::types::DeployTarget;

/// Runs `hooks/report` once per message, e.g. to post to a chat channel.
#[derive(Debug, Clone)]
pub struct HookReporter {
    script: PathBuf,
    project: String,
    target: DeployTarget,
}

impl HookReporter {
    pub fn new(script: impl Into<PathBuf>, project: impl Into<String>, target: DeployTarget) -> Self {
        Self {
            script: script.into(),
            project: project.into(),
            target,
        }
    }

    /// The hook reporter if `script` exists, otherwise a log-only reporter.
    pub fn or_log(script: &Path, project: &str, target: DeployTarget) -> Arc<dyn Reporter> {
        if script.is_file() {
            tracing::debug!("Reporting through hook {}", script.display());
            Arc::new(Self::new(script, project, target))
        } else {
            Arc::new(LogReporter)
        }
    }

    fn env(&self, message: &str) -> HashMap<&'static str, String> {
        HashMap::from([
            ("DEPLOY_REPORT_MESSAGE", message.to_string()),
            ("DEPLOY_TARGET", self.target.name().to_string()),
            ("DEPLOY_PROJECT", self.project.clone()),
        ])
    }
}

#[async_trait]
impl Reporter for HookReporter {
    async fn send(&self, message: &str) -> Result<(), ReportError> {
        let output = Command::new(&self.script)
            .envs(self.env(message))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ReportError::HookFailed(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}
