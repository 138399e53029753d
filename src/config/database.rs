// ABOUTME: Database reset settings for destructive deploys.
// ABOUTME: Names the application database, its owner, the template, and the dump to restore.

use serde::Deserialize;

use crate::types::DeployTarget;

/// Placeholder in `dump` replaced with the canonical target name.
pub const TARGET_PLACEHOLDER: &str = "{target}";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_template")]
    pub template: String,

    /// Pre-staged SQL dump, relative to the deploy working directory.
    #[serde(default = "default_dump")]
    pub dump: String,

    /// Extra backend-termination statements issued after the first one.
    #[serde(default = "default_terminate_retries")]
    pub terminate_retries: usize,
}

fn default_name() -> String {
    "app".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_template() -> String {
    "template0".to_string()
}

fn default_dump() -> String {
    format!("../db_dump_{}.sql", TARGET_PLACEHOLDER)
}

fn default_terminate_retries() -> usize {
    10
}

impl DatabaseConfig {
    pub fn dump_path(&self, target: DeployTarget) -> String {
        self.dump.replace(TARGET_PLACEHOLDER, target.name())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            name: default_name(),
            user: default_user(),
            template: default_template(),
            dump: default_dump(),
            terminate_retries: default_terminate_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let db = DatabaseConfig::default();
        assert_eq!(db.name, "app");
        assert_eq!(db.user, "postgres");
        assert_eq!(db.template, "template0");
        assert_eq!(db.terminate_retries, 10);
    }

    #[test]
    fn dump_path_substitutes_target() {
        let db = DatabaseConfig::default();
        assert_eq!(db.dump_path(DeployTarget::Staging), "../db_dump_stag.sql");
        assert_eq!(db.dump_path(DeployTarget::Production), "../db_dump_prod.sql");
    }
}
