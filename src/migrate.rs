// ABOUTME: Hook point for running schema migrations after a deploy that needs them.
// ABOUTME: No runner exists yet; the only trigger logs that migrations were skipped.

use async_trait::async_trait;

use crate::types::DeployTarget;

/// Starts schema migrations on a target. Opaque to the orchestrator.
#[async_trait]
pub trait MigrationTrigger: Send + Sync {
    async fn trigger(&self, target: DeployTarget);
}

/// Placeholder: the backend image runs migrations in its own prestart script.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredMigrations;

#[async_trait]
impl MigrationTrigger for DeferredMigrations {
    async fn trigger(&self, target: DeployTarget) {
        // TODO: run `alembic upgrade head` from CI once migrations leave the prestart script.
        tracing::info!("Launching migrations on {} (not really)", target);
    }
}
