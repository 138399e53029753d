// ABOUTME: Validated container image tag.
// ABOUTME: Follows the registry tag grammar: [A-Za-z0-9_][A-Za-z0-9_.-]{0,127}.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageTagError {
    #[error("image tag cannot be empty")]
    Empty,

    #[error("image tag exceeds maximum length of 128 characters")]
    TooLong,

    #[error("image tag cannot start with '{0}'")]
    InvalidStart(char),

    #[error("invalid character in image tag: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageTag(String);

impl ImageTag {
    pub fn new(value: &str) -> Result<Self, ImageTagError> {
        let value = value.trim();
        let first = value.chars().next().ok_or(ImageTagError::Empty)?;

        if value.len() > 128 {
            return Err(ImageTagError::TooLong);
        }

        if first == '.' || first == '-' {
            return Err(ImageTagError::InvalidStart(first));
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '.' && c != '-' {
                return Err(ImageTagError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ImageTag {
    type Error = ImageTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ImageTag> for String {
    fn from(tag: ImageTag) -> Self {
        tag.0
    }
}
