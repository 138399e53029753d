// ABOUTME: The deploy decision engine: fast or destructive, and whether to migrate.
// ABOUTME: Pure function over tags, target, and migration state; first matching rule wins.

use crate::types::{DeployTarget, ImageTag, MigrationHistory, MigrationId};

/// How the new image reaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployKind {
    /// Redeploy the stack in place.
    Fast,
    /// Drop the database, restore it from a dump, then redeploy.
    Destructive,
}

/// Migration state of the candidate image and of the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionState {
    /// Revision the candidate image expects (`alembic heads`).
    pub head: MigrationId,
    /// Every revision the candidate image knows about.
    pub history: MigrationHistory,
    /// Revision currently applied on the target.
    pub current: MigrationId,
}

impl VersionState {
    pub fn current_in_history(&self) -> bool {
        self.history.contains(&self.current)
    }
}

/// The rule that decided a deploy, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The candidate tag is already deployed.
    SameImage,
    /// Production is always redeployed in place; its schema is managed out of band.
    Production,
    /// The target already sits at the candidate's head revision.
    HeadMatches,
    /// The target is behind but on the candidate's upgrade path.
    InHistory,
    /// The target's revision is unknown to the candidate; only a reset is safe.
    Diverged,
}

impl Decision {
    pub fn message(&self) -> &'static str {
        match self {
            Decision::SameImage => "Fast deploy: deploying the same image.",
            Decision::Production => "Fast deploy: deploying on prod.",
            Decision::HeadMatches => "Fast deploy: alembic head is the same.",
            Decision::InHistory => "Fast deploy: current alembic version exists in history.",
            Decision::Diverged => "Destructive deploy. Some data may be lost.",
        }
    }

    pub fn kind(&self) -> DeployKind {
        match self {
            Decision::Diverged => DeployKind::Destructive,
            _ => DeployKind::Fast,
        }
    }

    pub fn needs_migration(&self) -> bool {
        matches!(self, Decision::InHistory | Decision::Diverged)
    }
}

/// Pick the deploy rule.
///
/// `current_tag` is `None` when no deploy was ever recorded; it never matches.
/// Production short-circuits before any migration check, so a diverged
/// production database is still redeployed in place.
pub fn decide(
    current_tag: Option<&ImageTag>,
    target_tag: &ImageTag,
    target: DeployTarget,
    versions: &VersionState,
) -> Decision {
    if current_tag == Some(target_tag) {
        Decision::SameImage
    } else if target.is_production() {
        Decision::Production
    } else if versions.current == versions.head {
        Decision::HeadMatches
    } else if versions.current_in_history() {
        Decision::InHistory
    } else {
        Decision::Diverged
    }
}
