// ABOUTME: Container image repository reference parsing and validation.
// ABOUTME: Handles backend, registry/org/backend, and the same with an explicit :tag.

use std::fmt;
use thiserror::Error;

use super::tag::{ImageTag, ImageTagError};

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("digest references are not supported: {0}")]
    Digest(String),

    #[error("invalid image tag: {0}")]
    Tag(#[from] ImageTagError),
}

/// An image repository, optionally pinned to a tag.
///
/// The configured backend image is normally untagged; the candidate tag is
/// attached per deploy with [`ImageRef::with_tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<ImageTag>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }
        if input.contains('@') {
            return Err(ParseImageRefError::Digest(input.to_string()));
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_'))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        // A colon after the last slash separates the tag; earlier colons belong
        // to a registry port.
        let last_slash = input.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match input[last_slash..].rfind(':') {
            Some(pos) => {
                let split = last_slash + pos;
                (&input[..split], Some(ImageTag::new(&input[split + 1..])?))
            }
            None => (input, None),
        };

        let (registry, name) = match repository.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, repository.to_string()),
        };

        if name.is_empty() || name.ends_with('/') {
            return Err(ParseImageRefError::Empty);
        }

        Ok(Self {
            registry,
            name,
            tag,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&ImageTag> {
        self.tag.as_ref()
    }

    /// The untagged repository, e.g. `registry.gitlab.com/org/backend`.
    pub fn repository(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }

    /// The same repository pinned to `tag`, replacing any existing tag.
    pub fn with_tag(&self, tag: &ImageTag) -> Self {
        Self {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: Some(tag.clone()),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository())?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        Ok(())
    }
}
