// ABOUTME: Configuration types and parsing for alembic-deploy.yml.
// ABOUTME: Handles YAML parsing, discovery, defaults, and env-backed registry credentials.

mod database;
mod env_value;
mod init;
mod inputs;
mod registry;
mod server;

pub use database::{DatabaseConfig, TARGET_PLACEHOLDER};
pub use env_value::EnvValue;
pub use init::init_config;
pub use inputs::{BRANCH_VAR, DeployInputs, TAG_VAR};
pub use registry::{RegistryAuth, RegistryConfig, UNSET_CREDENTIAL};
pub use server::ServerConfig;

use crate::error::{Error, Result};
use crate::types::{DeployTarget, ImageRef};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "alembic-deploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "alembic-deploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".alembic-deploy/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Short project name, used in reports and marker file names.
    #[serde(deserialize_with = "deserialize_project")]
    pub project: String,

    /// Backend image repository; the tag comes from the deploy inputs.
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    pub registry: RegistryConfig,

    /// Parent of the per-target directories holding the stack file.
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    #[serde(default = "default_stack_file")]
    pub stack_file: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Deploy host. When absent, commands run in a local shell.
    #[serde(default, deserialize_with = "deserialize_server")]
    pub server: Option<ServerConfig>,

    /// Holds version markers and the hooks directory.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_report_timeout", with = "humantime_serde")]
    pub report_timeout: Duration,
}

fn default_remote_root() -> String {
    "/home/ubuntu".to_string()
}

fn default_stack_file() -> String {
    "docker-stack.yml".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".alembic-deploy")
}

fn default_report_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                let mut config = Self::load(path)?;
                if config.state_dir.is_relative() {
                    config.state_dir = dir.join(&config.state_dir);
                }
                return Ok(config);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Replace the configured image repository (e.g. from `--image`).
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = image;
        self
    }

    /// Directory containing the per-target version markers.
    pub fn marker_dir(&self) -> PathBuf {
        self.state_dir.clone()
    }

    /// The notification hook script.
    pub fn report_hook(&self) -> PathBuf {
        self.state_dir.join("hooks").join("report")
    }

    /// Working directory of the stack on the deploy host.
    pub fn target_dir(&self, target: DeployTarget) -> String {
        format!("{}/{}", self.remote_root.trim_end_matches('/'), target.name())
    }

    pub fn template() -> Self {
        Config {
            project: "my-project".to_string(),
            image: ImageRef::parse("registry.example.com/my-org/backend")
                .expect("template image reference is valid"),
            registry: RegistryConfig {
                host: "registry.example.com/my-org".to_string(),
                username: EnvValue::from_env("REGISTRY_USERNAME"),
                password: EnvValue::from_env("REGISTRY_PASSWORD"),
            },
            remote_root: default_remote_root(),
            stack_file: default_stack_file(),
            database: DatabaseConfig::default(),
            server: None,
            state_dir: default_state_dir(),
            report_timeout: default_report_timeout(),
        }
    }
}

// Custom deserializers

fn deserialize_project<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("project name cannot be empty"));
    }
    if let Some(c) = s
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        return Err(serde::de::Error::custom(format!(
            "invalid character in project name: '{}'",
            c
        )));
    }
    Ok(s)
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> std::result::Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

fn deserialize_server<'de, D>(deserializer: D) -> std::result::Result<Option<ServerConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<ServerEntry>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ServerEntry::Simple(s)) => ServerConfig::parse(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(ServerEntry::Detailed(c)) => Ok(Some(c)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerEntry {
    Simple(String),
    Detailed(ServerConfig),
}
