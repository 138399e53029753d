// ABOUTME: Config values that are either literals or read from an environment variable.
// ABOUTME: Used for registry credentials so secrets never live in the config file.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn from_env(var: impl Into<String>) -> Self {
        EnvValue::FromEnv {
            var: var.into(),
            default: None,
        }
    }

    /// Resolve a literal, or look the variable up with `lookup`.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => lookup(var)
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(var.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let value = EnvValue::Literal("bot".to_string());
        assert_eq!(value.resolve_with(|_| None).unwrap(), "bot");
    }

    #[test]
    fn env_reference_uses_lookup_then_default() {
        let value = EnvValue::FromEnv {
            var: "REGISTRY_USER".to_string(),
            default: Some("fallback".to_string()),
        };
        assert_eq!(
            value
                .resolve_with(|v| (v == "REGISTRY_USER").then(|| "ci".to_string()))
                .unwrap(),
            "ci"
        );
        assert_eq!(value.resolve_with(|_| None).unwrap(), "fallback");
    }

    #[test]
    fn missing_env_without_default_is_an_error() {
        let err = EnvValue::from_env("NOPE").resolve_with(|_| None).unwrap_err();
        assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "NOPE"));
    }
}
