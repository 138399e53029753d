// ABOUTME: Container registry login settings for the stack deploy command.
// ABOUTME: Credentials are EnvValues and resolve once per deploy into RegistryAuth.

use serde::Deserialize;

use super::EnvValue;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// Registry passed to `docker login`, e.g. `registry.gitlab.com/org/project`.
    pub host: String,
    pub username: EnvValue,
    pub password: EnvValue,
}

impl RegistryConfig {
    pub fn resolve_with(&self, lookup: &impl Fn(&str) -> Option<String>) -> Result<RegistryAuth> {
        Ok(RegistryAuth {
            host: self.host.clone(),
            username: self.username.resolve_with(lookup)?,
            password: self.password.resolve_with(lookup)?,
        })
    }

    /// Resolve what can be resolved, substituting [`UNSET_CREDENTIAL`] for the rest.
    pub fn resolve_lenient(&self, lookup: &impl Fn(&str) -> Option<String>) -> RegistryAuth {
        let lenient = |value: &EnvValue| {
            value.resolve_with(lookup).unwrap_or_else(|e| {
                tracing::debug!("registry credential not resolved: {}", e);
                UNSET_CREDENTIAL.to_string()
            })
        };
        RegistryAuth {
            host: self.host.clone(),
            username: lenient(&self.username),
            password: lenient(&self.password),
        }
    }
}

/// Stand-in for a registry credential that did not resolve.
pub const UNSET_CREDENTIAL: &str = "<unset>";

/// Resolved registry credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
