// ABOUTME: Alembic migration identifiers and per-lineage migration history.
// ABOUTME: Identifiers are opaque; only equality and history membership are meaningful.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationIdError {
    #[error("migration id cannot be empty")]
    Empty,

    #[error("migration id cannot contain whitespace: {0:?}")]
    ContainsWhitespace(String),
}

/// One schema migration step, as alembic names it (e.g. `3f2a9c1b7d4e`).
///
/// Deliberately not `Ord`: revisions are ordered by history, never by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(value: &str) -> Result<Self, MigrationIdError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(MigrationIdError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(MigrationIdError::ContainsWhitespace(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every migration ever issued for one backend lineage, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationHistory(Vec<MigrationId>);

impl MigrationHistory {
    pub fn new(revisions: Vec<MigrationId>) -> Self {
        Self(revisions)
    }

    pub fn contains(&self, id: &MigrationId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationId> {
        self.0.iter()
    }
}

impl FromIterator<MigrationId> for MigrationHistory {
    fn from_iter<I: IntoIterator<Item = MigrationId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
