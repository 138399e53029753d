// ABOUTME: The closed set of deploy targets (staging and production).
// ABOUTME: Canonical short names are used for remote paths, stacks, and db containers.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown deploy target: {0} (expected stag or prod)")]
pub struct UnknownTarget(pub String);

/// An environment with its own database, stack, and deployment paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployTarget {
    Staging,
    Production,
}

impl DeployTarget {
    /// Canonical name: `stag` or `prod`.
    pub fn name(&self) -> &'static str {
        match self {
            DeployTarget::Staging => "stag",
            DeployTarget::Production => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, DeployTarget::Production)
    }

    /// Name filter for the target's database container, e.g. `stag_db`.
    pub fn db_container_filter(&self) -> String {
        format!("{}_db", self.name())
    }
}

impl FromStr for DeployTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stag" | "staging" => Ok(DeployTarget::Staging),
            "prod" | "production" => Ok(DeployTarget::Production),
            _ => Err(UnknownTarget(s.to_string())),
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
