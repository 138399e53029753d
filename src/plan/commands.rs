// ABOUTME: Builds the shell command sequences for fast and destructive deploys.
// ABOUTME: Destructive sequences reset the target database from a dump before the stack deploy.

use nonempty::NonEmpty;

use crate::config::{Config, DatabaseConfig, RegistryAuth};
use crate::shell::{ShellCommand, shell_quote};
use crate::types::DeployTarget;

use super::decision::DeployKind;

/// Builds the commands for one target.
#[derive(Debug, Clone)]
pub struct CommandBuilder<'a> {
    target: DeployTarget,
    target_dir: String,
    stack_file: &'a str,
    database: &'a DatabaseConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a Config, target: DeployTarget) -> Self {
        Self {
            target,
            target_dir: config.target_dir(target),
            stack_file: &config.stack_file,
            database: &config.database,
        }
    }

    /// Log in to the registry and redeploy the target's stack.
    ///
    /// Credentials are quoted and the password goes in on stdin through the
    /// `printf` builtin, so it never shows up in the remote process list.
    pub fn deploy_command(&self, registry: &RegistryAuth) -> ShellCommand {
        let password = shell_quote(&registry.password);
        ShellCommand::new(format!(
            "cd {} && printf '%s' {} | docker login -u {} --password-stdin {} && docker stack deploy -c {} --with-registry-auth {}",
            self.target_dir,
            password,
            shell_quote(&registry.username),
            shell_quote(&registry.host),
            self.stack_file,
            self.target,
        ))
        .with_secret(password)
        .with_secret(&registry.password)
    }

    /// The full sequence for `kind`; always ends with `deploy`.
    pub fn sequence(&self, kind: DeployKind, deploy: ShellCommand) -> NonEmpty<ShellCommand> {
        match kind {
            DeployKind::Fast => NonEmpty::new(deploy),
            DeployKind::Destructive => self.destructive_sequence(deploy),
        }
    }

    /// Reset the database from the pre-staged dump, then run `deploy`.
    pub fn destructive_sequence(&self, deploy: ShellCommand) -> NonEmpty<ShellCommand> {
        let db = &self.database.name;
        let terminate = self.psql(&format!(
            "SELECT pg_terminate_backend(pg_stat_activity.pid) FROM pg_stat_activity \
             WHERE pg_stat_activity.datname = '{}' AND pid <> pg_backend_pid();",
            db
        ));

        let mut commands = NonEmpty::new(self.psql(&format!(
            "REVOKE CONNECT ON DATABASE {} FROM public;",
            db
        )));
        commands.push(terminate.clone());
        // Connections can slip in between revoke and terminate; hammer them.
        for _ in 0..self.database.terminate_retries {
            commands.push(terminate.clone().best_effort());
        }
        commands.push(self.psql(&format!("DROP DATABASE IF EXISTS {};", db)));
        commands.push(self.db_exec(&format!(
            "bash -c \"createdb -U {} -T {} {}\"",
            self.database.user, self.database.template, db
        )));
        commands.push(ShellCommand::new(format!(
            "docker exec -i {} psql -U {} {} < {}",
            self.db_container(),
            self.database.user,
            db,
            self.database.dump_path(self.target)
        )));
        commands.push(self.psql(&format!("GRANT CONNECT ON DATABASE {} TO public;", db)));
        commands.push(deploy);
        commands
    }

    /// Number of commands a destructive sequence runs before the deploy command.
    pub fn destructive_prefix_len(&self) -> usize {
        // revoke, terminate, retries, drop, create, restore, grant
        6 + self.database.terminate_retries
    }

    fn db_container(&self) -> String {
        format!(
            "$(docker ps -q -f name={})",
            self.target.db_container_filter()
        )
    }

    fn db_exec(&self, command: &str) -> ShellCommand {
        ShellCommand::new(format!("docker exec {} {}", self.db_container(), command))
    }

    fn psql(&self, sql: &str) -> ShellCommand {
        self.db_exec(&format!("psql -U {} -c \"{}\"", self.database.user, sql))
    }
}
