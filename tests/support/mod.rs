// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for the shell, version source, reporter, and marker store.

#![allow(dead_code)]

use alembic_deploy::config::{Config, DeployInputs, RegistryAuth};
use alembic_deploy::marker::{MarkerError, MarkerStore, VersionMarker};
use alembic_deploy::migrate::MigrationTrigger;
use alembic_deploy::probe::{ProbeError, VersionSource};
use alembic_deploy::report::{ReportError, Reporter};
use alembic_deploy::shell::{CommandOutput, ExecError, Shell, ShellCommand};
use alembic_deploy::types::{
    DeployTarget, ImageRef, ImageTag, MigrationHistory, MigrationId,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("alembic_deploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn config() -> Config {
    Config::from_yaml(
        r#"
project: shop
image: registry.example.com/acme/backend
registry:
  host: registry.example.com/acme
  username: deployer
  password: hunter2
report_timeout: 5s
"#,
    )
    .unwrap()
}

pub fn tag(s: &str) -> ImageTag {
    ImageTag::new(s).unwrap()
}

pub fn rev(s: &str) -> MigrationId {
    MigrationId::new(s).unwrap()
}

pub fn history(revs: &[&str]) -> MigrationHistory {
    revs.iter().map(|r| rev(r)).collect()
}

pub fn inputs(t: &str, branch: Option<&str>) -> DeployInputs {
    DeployInputs {
        tag: tag(t),
        branch: branch.map(str::to_string),
        registry: RegistryAuth {
            host: "registry.example.com/acme".to_string(),
            username: "deployer".to_string(),
            password: "hunter2".to_string(),
        },
    }
}

/// Records every script it is asked to run; fails the first one containing `fail_on`.
#[derive(Default)]
pub struct FakeShell {
    pub ran: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl FakeShell {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            ran: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        self.ran.lock().clone()
    }
}

#[async_trait]
impl Shell for FakeShell {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, ExecError> {
        self.ran.lock().push(command.script().to_string());
        let failed = self
            .fail_on
            .as_deref()
            .is_some_and(|needle| command.script().contains(needle));
        Ok(CommandOutput {
            exit_code: Some(if failed { 1 } else { 0 }),
            stdout: String::new(),
            stderr: if failed { "boom".to_string() } else { String::new() },
        })
    }
}

/// Canned migration state; `fail` makes every query error out.
pub struct FakeSource {
    pub head: &'static str,
    pub history: Vec<&'static str>,
    pub current: &'static str,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(head: &'static str, history: &[&'static str], current: &'static str) -> Self {
        Self {
            head,
            history: history.to_vec(),
            current,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("a", &[], "a")
        }
    }
}

#[async_trait]
impl VersionSource for FakeSource {
    async fn head_migration(
        &self,
        _image: &ImageRef,
        _tag: &ImageTag,
    ) -> Result<MigrationId, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProbeError::NoHead);
        }
        Ok(rev(self.head))
    }

    async fn history(
        &self,
        _image: &ImageRef,
        _tag: &ImageTag,
    ) -> Result<MigrationHistory, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(history(&self.history))
    }

    async fn current_migration(&self, _target: DeployTarget) -> Result<MigrationId, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(rev(self.current))
    }
}

/// Sleeps before "delivering", then records the message.
pub struct SlowReporter {
    delay: Duration,
    pub delivered: Mutex<Vec<String>>,
}

impl SlowReporter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl Reporter for SlowReporter {
    async fn send(&self, message: &str) -> Result<(), ReportError> {
        tokio::time::sleep(self.delay).await;
        self.delivered.lock().push(message.to_string());
        Ok(())
    }
}

pub struct FailingReporter;

#[async_trait]
impl Reporter for FailingReporter {
    async fn send(&self, _message: &str) -> Result<(), ReportError> {
        Err(ReportError::Delivery("chat API returned 502".to_string()))
    }
}

#[derive(Default)]
pub struct MemoryMarkerStore {
    pub markers: Mutex<HashMap<DeployTarget, VersionMarker>>,
    pub corrupt: bool,
    pub read_only: bool,
    pub loads: AtomicUsize,
}

impl MemoryMarkerStore {
    pub fn with(target: DeployTarget, tag_str: &str) -> Self {
        let store = Self::default();
        store
            .markers
            .lock()
            .insert(target, VersionMarker::new(tag(tag_str), Some("main".to_string())));
        store
    }

    pub fn get(&self, target: DeployTarget) -> Option<VersionMarker> {
        self.markers.lock().get(&target).cloned()
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn load(&self, target: DeployTarget) -> Result<Option<VersionMarker>, MarkerError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.corrupt {
            let source = serde_json::from_str::<VersionMarker>("{").unwrap_err();
            return Err(MarkerError::Corrupt {
                path: "memory".into(),
                source,
            });
        }
        Ok(self.get(target))
    }

    fn save(&self, target: DeployTarget, marker: &VersionMarker) -> Result<(), MarkerError> {
        if self.read_only {
            return Err(MarkerError::Write {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.markers.lock().insert(target, marker.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMigrations {
    pub triggered: Mutex<Vec<DeployTarget>>,
}

#[async_trait]
impl MigrationTrigger for RecordingMigrations {
    async fn trigger(&self, target: DeployTarget) {
        self.triggered.lock().push(target);
    }
}
