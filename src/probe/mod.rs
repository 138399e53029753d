// ABOUTME: Version source: migration state of candidate images and target databases.
// ABOUTME: AlembicProbe asks the image's alembic and the target's alembic_version table.

mod parse;

pub use parse::{parse_current, parse_heads, parse_history};

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::plan::VersionState;
use crate::shell::{ExecError, Shell, ShellCommand};
use crate::types::{
    DeployTarget, ImageRef, ImageTag, MigrationHistory, MigrationId, MigrationIdError,
};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe command failed: {0}")]
    Exec(#[from] ExecError),

    #[error("`{}` exited with {}: {}", .command, exit_label(.exit_code), .stderr.trim())]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("alembic reported no head revision")]
    NoHead,

    #[error("alembic reported multiple heads: {}", .0.join(", "))]
    MultipleHeads(Vec<String>),

    #[error("no alembic version recorded in the {0} database")]
    NoCurrentVersion(DeployTarget),

    #[error("unparseable alembic output: {0}")]
    Unparseable(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(#[from] MigrationIdError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Where migration state comes from.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// The revision `image:tag` would migrate to.
    async fn head_migration(
        &self,
        image: &ImageRef,
        tag: &ImageTag,
    ) -> Result<MigrationId, ProbeError>;

    /// Every revision `image:tag` knows about.
    async fn history(
        &self,
        image: &ImageRef,
        tag: &ImageTag,
    ) -> Result<MigrationHistory, ProbeError>;

    /// The revision currently applied on `target`.
    async fn current_migration(&self, target: DeployTarget) -> Result<MigrationId, ProbeError>;
}

/// Query all three in order; the first failure wins.
pub async fn version_state(
    source: &(impl VersionSource + ?Sized),
    image: &ImageRef,
    tag: &ImageTag,
    target: DeployTarget,
) -> Result<VersionState, ProbeError> {
    let head = source.head_migration(image, tag).await?;
    let history = source.history(image, tag).await?;
    let current = source.current_migration(target).await?;

    tracing::info!(
        "Candidate head {}, {} revisions in history; {} is at {}",
        head,
        history.len(),
        target,
        current
    );

    Ok(VersionState {
        head,
        history,
        current,
    })
}

/// Runs alembic inside the candidate image and psql inside the target's
/// database container, through any [`Shell`].
pub struct AlembicProbe<'a, S: Shell + ?Sized> {
    shell: &'a S,
    database: &'a DatabaseConfig,
}

impl<'a, S: Shell + ?Sized> AlembicProbe<'a, S> {
    pub fn new(shell: &'a S, database: &'a DatabaseConfig) -> Self {
        Self { shell, database }
    }

    async fn capture(&self, command: ShellCommand) -> Result<String, ProbeError> {
        tracing::debug!("Probing: {}", command);
        let output = self.shell.run(&command).await?;
        if !output.success() {
            return Err(ProbeError::CommandFailed {
                command: command.redacted(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    fn alembic(image: &ImageRef, tag: &ImageTag, subcommand: &str) -> ShellCommand {
        ShellCommand::new(format!(
            "docker run --rm {} alembic {}",
            image.with_tag(tag),
            subcommand
        ))
    }
}

#[async_trait]
impl<S: Shell + ?Sized> VersionSource for AlembicProbe<'_, S> {
    async fn head_migration(
        &self,
        image: &ImageRef,
        tag: &ImageTag,
    ) -> Result<MigrationId, ProbeError> {
        let stdout = self.capture(Self::alembic(image, tag, "heads")).await?;
        parse_heads(&stdout)
    }

    async fn history(
        &self,
        image: &ImageRef,
        tag: &ImageTag,
    ) -> Result<MigrationHistory, ProbeError> {
        let stdout = self.capture(Self::alembic(image, tag, "history")).await?;
        parse_history(&stdout)
    }

    async fn current_migration(&self, target: DeployTarget) -> Result<MigrationId, ProbeError> {
        let command = ShellCommand::new(format!(
            "docker exec $(docker ps -q -f name={}) psql -U {} {} -tAc \"SELECT version_num FROM alembic_version;\"",
            target.db_container_filter(),
            self.database.user,
            self.database.name
        ));
        let stdout = self.capture(command).await?;
        parse_current(&stdout)?.ok_or(ProbeError::NoCurrentVersion(target))
    }
}
