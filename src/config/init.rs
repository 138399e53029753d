// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes an alembic-deploy.yml template with env-backed registry credentials.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ImageRef;

use super::{CONFIG_FILENAME, Config, EnvValue};

pub fn init_config(
    dir: &Path,
    project: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(p) = project {
        config.project = p.to_string();
    }

    if let Some(i) = image {
        config.image = ImageRef::parse(i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(registry) = config.image.registry() {
            config.registry.host = registry.to_string();
        }
    }

    let yaml = generate_template_yaml(&config);
    // Round-trip so a bad --project fails here rather than on the first deploy.
    Config::from_yaml(&yaml)?;
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn env_var_name(value: &EnvValue) -> &str {
    match value {
        EnvValue::FromEnv { var, .. } => var,
        EnvValue::Literal(_) => "REGISTRY_SECRET",
    }
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"project: {}
image: {}
registry:
  host: {}
  username: {{ env: {} }}
  password: {{ env: {} }}
remote_root: {}
stack_file: {}
database:
  name: {}
  user: {}
  template: {}
  dump: "{}"
  terminate_retries: {}
# Run commands on a remote host instead of the local shell:
# server: deploy@deploy.example.com:22
report_timeout: {}s
"#,
        config.project,
        config.image,
        config.registry.host,
        env_var_name(&config.registry.username),
        env_var_name(&config.registry.password),
        config.remote_root,
        config.stack_file,
        config.database.name,
        config.database.user,
        config.database.template,
        config.database.dump,
        config.database.terminate_retries,
        config.report_timeout.as_secs(),
    )
}
