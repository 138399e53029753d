// ABOUTME: Version marker: the (tag, branch) last successfully deployed to a target.
// ABOUTME: Stored as one JSON file per target, replaced atomically on save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{DeployTarget, ImageTag};

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("marker file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize marker: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What was last deployed to a target, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMarker {
    pub tag: ImageTag,
    #[serde(default)]
    pub branch: Option<String>,
    pub deployed_at: DateTime<Utc>,
    /// Hostname of the machine that ran the deploy.
    pub deployed_by: String,
}

impl VersionMarker {
    pub fn new(tag: ImageTag, branch: Option<String>) -> Self {
        Self {
            tag,
            branch,
            deployed_at: Utc::now(),
            deployed_by: gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }
}

/// Persistence for version markers.
pub trait MarkerStore: Send + Sync {
    /// `Ok(None)` when nothing was ever recorded for `target`.
    fn load(&self, target: DeployTarget) -> Result<Option<VersionMarker>, MarkerError>;

    fn save(&self, target: DeployTarget, marker: &VersionMarker) -> Result<(), MarkerError>;
}

/// Stores markers as `<dir>/<project>-<target>.json`.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    dir: PathBuf,
    project: String,
}

impl FileMarkerStore {
    pub fn new(dir: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            project: project.into(),
        }
    }

    pub fn path(&self, target: DeployTarget) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", self.project, target.name()))
    }
}

impl MarkerStore for FileMarkerStore {
    fn load(&self, target: DeployTarget) -> Result<Option<VersionMarker>, MarkerError> {
        let path = self.path(target);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MarkerError::Read { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| MarkerError::Corrupt { path, source })
    }

    fn save(&self, target: DeployTarget, marker: &VersionMarker) -> Result<(), MarkerError> {
        let path = self.path(target);
        let json = serde_json::to_string_pretty(marker)?;
        write_atomic(&path, json.as_bytes()).map_err(|source| MarkerError::Write { path, source })
    }
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
