// ABOUTME: Fire-and-forget deploy notifications and the join barrier that flushes them.
// ABOUTME: Delivery failures are collected for diagnostics, never escalated.

mod hook;

pub use hook::HookReporter;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to run report hook: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("report hook exited with code {0:?}: {1}")]
    HookFailed(Option<i32>, String),

    #[error("report timed out after {0:?}")]
    Timeout(Duration),

    #[error("report task aborted: {0}")]
    Aborted(String),

    #[error("report delivery failed: {0}")]
    Delivery(String),
}

/// A notification sink.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), ReportError>;
}

/// Reporter used when no hook is installed: the message only goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    async fn send(&self, message: &str) -> Result<(), ReportError> {
        tracing::info!(target: "alembic_deploy::report", "{}", message);
        Ok(())
    }
}

/// Outstanding reports for one deploy.
///
/// Each report runs as its own task; [`ReportSet::join`] waits for all of them.
/// Every report completes exactly once: delivered, failed, or timed out.
pub struct ReportSet {
    reporter: Arc<dyn Reporter>,
    timeout: Duration,
    pending: Vec<JoinHandle<Result<(), ReportError>>>,
}

impl ReportSet {
    pub fn new(reporter: Arc<dyn Reporter>, timeout: Duration) -> Self {
        Self {
            reporter,
            timeout,
            pending: Vec::new(),
        }
    }

    /// Start delivering `message` without waiting for it.
    pub fn spawn(&mut self, message: String) {
        let reporter = Arc::clone(&self.reporter);
        let timeout = self.timeout;
        tracing::debug!("Reporting: {}", message);

        self.pending.push(tokio::spawn(async move {
            match tokio::time::timeout(timeout, reporter.send(&message)).await {
                Ok(result) => result,
                Err(_) => Err(ReportError::Timeout(timeout)),
            }
        }));
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every outstanding report; returns the ones that failed.
    pub async fn join(&mut self) -> Vec<ReportError> {
        futures::future::join_all(self.pending.drain(..))
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(e) => Some(ReportError::Aborted(e.to_string())),
            })
            .collect()
    }
}

impl std::fmt::Debug for ReportSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSet")
            .field("timeout", &self.timeout)
            .field("outstanding", &self.pending.len())
            .finish()
    }
}
