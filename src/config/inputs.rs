// ABOUTME: Per-invocation deploy inputs read from the environment exactly once.
// ABOUTME: TAG and BRANCH describe the candidate; registry credentials come from config.

use super::{Config, RegistryAuth};
use crate::error::{Error, Result};
use crate::types::ImageTag;

pub const TAG_VAR: &str = "TAG";
pub const BRANCH_VAR: &str = "BRANCH";

/// Everything a deploy reads from the environment, gathered up front and then
/// passed immutably through the decision path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployInputs {
    /// Image tag being deployed.
    pub tag: ImageTag,
    /// Source branch the tag was built from; only used in reports and markers.
    pub branch: Option<String>,
    pub registry: RegistryAuth,
}

impl DeployInputs {
    pub fn gather(config: &Config) -> Result<Self> {
        Self::gather_with(config, |var| std::env::var(var).ok())
    }

    pub fn gather_with(config: &Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (tag, branch) = candidate(&lookup)?;
        let registry = config.registry.resolve_with(&lookup)?;

        Ok(Self {
            tag,
            branch,
            registry,
        })
    }

    /// Gather inputs for a dry run.
    ///
    /// `TAG` is still required, but registry credentials that do not resolve
    /// are replaced by a placeholder since nothing will log in.
    pub fn gather_for_plan(config: &Config) -> Result<Self> {
        Self::gather_for_plan_with(config, |var| std::env::var(var).ok())
    }

    pub fn gather_for_plan_with(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let (tag, branch) = candidate(&lookup)?;
        let registry = config.registry.resolve_lenient(&lookup);

        Ok(Self {
            tag,
            branch,
            registry,
        })
    }

    pub fn branch_or_unknown(&self) -> &str {
        self.branch.as_deref().unwrap_or("unknown")
    }
}

fn candidate(lookup: &impl Fn(&str) -> Option<String>) -> Result<(ImageTag, Option<String>)> {
    let tag = lookup(TAG_VAR)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::MissingEnvVar(TAG_VAR.to_string()))?;
    let tag =
        ImageTag::new(&tag).map_err(|e| Error::InvalidInput(format!("{}: {}", TAG_VAR, e)))?;

    let branch = lookup(BRANCH_VAR)
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    Ok((tag, branch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNSET_CREDENTIAL;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn gathers_tag_branch_and_credentials() {
        let config = Config::template();
        let inputs = DeployInputs::gather_with(
            &config,
            env(&[
                ("TAG", "build-42"),
                ("BRANCH", "main"),
                ("REGISTRY_USERNAME", "bot"),
                ("REGISTRY_PASSWORD", "s3cret"),
            ]),
        )
        .unwrap();

        assert_eq!(inputs.tag.as_str(), "build-42");
        assert_eq!(inputs.branch.as_deref(), Some("main"));
        assert_eq!(inputs.registry.username, "bot");
        assert_eq!(inputs.registry.password, "s3cret");
    }

    #[test]
    fn missing_tag_is_an_error() {
        let config = Config::template();
        let err = DeployInputs::gather_with(&config, env(&[("TAG", "  ")])).unwrap_err();
        assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "TAG"));
    }

    #[test]
    fn invalid_tag_is_an_error() {
        let config = Config::template();
        let err = DeployInputs::gather_with(&config, env(&[("TAG", "bad tag")])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn branch_is_optional() {
        let config = Config::template();
        let inputs = DeployInputs::gather_with(
            &config,
            env(&[
                ("TAG", "v1"),
                ("REGISTRY_USERNAME", "bot"),
                ("REGISTRY_PASSWORD", "pw"),
            ]),
        )
        .unwrap();
        assert!(inputs.branch.is_none());
        assert_eq!(inputs.branch_or_unknown(), "unknown");
    }

    #[test]
    fn missing_credentials_are_an_error() {
        let config = Config::template();
        let err = DeployInputs::gather_with(&config, env(&[("TAG", "v1")])).unwrap_err();
        assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "REGISTRY_USERNAME"));
    }

    #[test]
    fn plan_tolerates_missing_credentials() {
        let config = Config::template();
        let inputs =
            DeployInputs::gather_for_plan_with(&config, env(&[("TAG", "v1"), ("BRANCH", "dev")]))
                .unwrap();

        assert_eq!(inputs.tag.as_str(), "v1");
        assert_eq!(inputs.branch.as_deref(), Some("dev"));
        assert_eq!(inputs.registry.host, config.registry.host);
        assert_eq!(inputs.registry.username, UNSET_CREDENTIAL);
        assert_eq!(inputs.registry.password, UNSET_CREDENTIAL);
    }

    #[test]
    fn plan_keeps_credentials_that_resolve() {
        let config = Config::template();
        let inputs = DeployInputs::gather_for_plan_with(
            &config,
            env(&[("TAG", "v1"), ("REGISTRY_USERNAME", "bot")]),
        )
        .unwrap();

        assert_eq!(inputs.registry.username, "bot");
        assert_eq!(inputs.registry.password, UNSET_CREDENTIAL);
    }

    #[test]
    fn plan_still_requires_a_tag() {
        let config = Config::template();
        let err = DeployInputs::gather_for_plan_with(&config, env(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "TAG"));
    }
}
