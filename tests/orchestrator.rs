// ABOUTME: Integration tests for the deploy orchestrator.
// ABOUTME: Covers ordering, marker persistence, report draining, and failure paths.

mod support;

use alembic_deploy::deploy::{DeployErrorKind, Orchestrator};
use alembic_deploy::diagnostics::{Diagnostics, WarningKind};
use alembic_deploy::plan::{Decision, DeployKind};
use alembic_deploy::types::DeployTarget;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use support::*;

const STAG: DeployTarget = DeployTarget::Staging;

mod decisions {
    use super::*;

    #[tokio::test]
    async fn same_tag_redeploys_without_migration() {
        init_tracing();
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "zzz");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::with(STAG, "build-7");
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        let outcome = orchestrator
            .deploy(STAG, &inputs("build-7", Some("main")), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::SameImage);
        assert_eq!(shell.scripts().len(), 1);
        assert!(migrations.triggered.lock().is_empty());
    }

    #[tokio::test]
    async fn diverged_history_runs_destructive_sequence() {
        let config = config();
        let source = FakeSource::new("c", &["a", "b", "c"], "x");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        let outcome = orchestrator
            .deploy(STAG, &inputs("build-8", None), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(outcome.decision.kind(), DeployKind::Destructive);
        let scripts = shell.scripts();
        assert_eq!(scripts.len(), 17);
        assert!(scripts[0].contains("REVOKE CONNECT ON DATABASE app FROM public;"));
        assert!(scripts[12].contains("DROP DATABASE IF EXISTS app;"));
        assert!(scripts[16].contains("docker stack deploy -c docker-stack.yml --with-registry-auth stag"));
        assert_eq!(*migrations.triggered.lock(), vec![STAG]);
    }

    #[tokio::test]
    async fn production_never_resets_the_database() {
        let config = config();
        let source = FakeSource::new("c", &["a", "b", "c"], "x");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        let outcome = orchestrator
            .deploy(
                DeployTarget::Production,
                &inputs("build-9", None),
                &mut Diagnostics::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::Production);
        let scripts = shell.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].starts_with("cd /home/ubuntu/prod && "));
        assert!(scripts[0].contains("docker login -u 'deployer' --password-stdin"));
    }

    #[tokio::test]
    async fn plan_runs_nothing() {
        let config = config();
        let source = FakeSource::new("c", &["a", "b", "c"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        let deployment = orchestrator
            .plan(STAG, &inputs("build-10", None), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(deployment.plan().decision(), Decision::InHistory);
        assert!(deployment.plan().needs_migration());
        assert!(shell.scripts().is_empty());
        assert!(store.get(STAG).is_none());
    }
}

mod markers {
    use super::*;

    #[tokio::test]
    async fn marker_is_written_after_success() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::with(STAG, "build-1");
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        orchestrator
            .deploy(STAG, &inputs("build-2", Some("feature/x")), &mut Diagnostics::default())
            .await
            .unwrap();

        let marker = store.get(STAG).unwrap();
        assert_eq!(marker.tag.as_str(), "build-2");
        assert_eq!(marker.branch.as_deref(), Some("feature/x"));
    }

    #[tokio::test]
    async fn marker_is_untouched_when_a_command_fails() {
        let config = config();
        let source = FakeSource::new("c", &["a", "b", "c"], "x");
        let shell = FakeShell::failing_on("DROP DATABASE");
        let store = MemoryMarkerStore::with(STAG, "build-1");
        let migrations = RecordingMigrations::default();
        let reporter = Arc::new(SlowReporter::new(Duration::ZERO));
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            reporter.clone(),
            &migrations,
        );

        let err = orchestrator
            .deploy(STAG, &inputs("build-2", None), &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Execution);
        assert_eq!(err.failed_command(), Some(12));
        assert_eq!(shell.scripts().len(), 13);
        assert_eq!(store.get(STAG).unwrap().tag.as_str(), "build-1");
        assert!(migrations.triggered.lock().is_empty());
        // The pre-deploy report still went out; no success report.
        assert_eq!(reporter.messages().len(), 1);
    }

    #[tokio::test]
    async fn best_effort_terminate_failures_do_not_abort() {
        let config = config();
        let source = FakeSource::new("c", &["a", "b", "c"], "x");
        let shell = FakeShell::failing_on("pg_terminate_backend");
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );

        let err = orchestrator
            .deploy(STAG, &inputs("build-2", None), &mut Diagnostics::default())
            .await
            .unwrap_err();

        // The first terminate is checked, the repeats are not.
        assert_eq!(err.failed_command(), Some(1));
        assert_eq!(shell.scripts().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_marker_counts_as_first_deploy() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore {
            corrupt: true,
            ..Default::default()
        };
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );
        let mut diag = Diagnostics::default();

        let outcome = orchestrator
            .deploy(STAG, &inputs("build-2", None), &mut diag)
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::HeadMatches);
        assert_eq!(diag.count(WarningKind::MarkerUnreadable), 1);
    }

    #[tokio::test]
    async fn marker_write_failure_is_fatal() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore {
            read_only: true,
            ..Default::default()
        };
        let migrations = RecordingMigrations::default();
        let reporter = Arc::new(SlowReporter::new(Duration::from_millis(50)));
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            reporter.clone(),
            &migrations,
        );

        let err = orchestrator
            .deploy(STAG, &inputs("build-2", None), &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::MarkerWrite);
        assert_eq!(reporter.messages().len(), 2);
    }
}

mod reports {
    use super::*;

    #[tokio::test]
    async fn slow_reports_finish_before_deploy_returns() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let reporter = Arc::new(SlowReporter::new(Duration::from_millis(200)));
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            reporter.clone(),
            &migrations,
        );

        let start = Instant::now();
        orchestrator
            .deploy(STAG, &inputs("build-3", Some("main")), &mut Diagnostics::default())
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
        let messages = reporter.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(
            &"[shop] stag. Fast deploy: alembic head is the same. Target branch: main.".to_string()
        ));
        assert!(
            messages
                .iter()
                .any(|m| m.starts_with("[shop] stag. Deploy successful. Approximate downtime: "))
        );
    }

    #[tokio::test]
    async fn missing_branch_is_reported_as_unknown() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "a");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let reporter = Arc::new(SlowReporter::new(Duration::ZERO));
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            reporter.clone(),
            &migrations,
        );

        orchestrator
            .deploy(STAG, &inputs("build-3", None), &mut Diagnostics::default())
            .await
            .unwrap();

        assert!(reporter.messages().contains(
            &"[shop] stag. Fast deploy: current alembic version exists in history. Target branch: unknown."
                .to_string()
        ));
    }

    #[tokio::test]
    async fn delivery_failures_become_warnings() {
        let config = config();
        let source = FakeSource::new("b", &["a", "b"], "b");
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(FailingReporter),
            &migrations,
        );
        let mut diag = Diagnostics::default();

        orchestrator
            .deploy(STAG, &inputs("build-4", None), &mut diag)
            .await
            .unwrap();

        assert_eq!(diag.count(WarningKind::ReportDelivery), 2);
        assert!(store.get(STAG).is_some());
    }

    #[tokio::test]
    async fn version_query_failure_runs_and_reports_nothing() {
        let config = config();
        let source = FakeSource::failing();
        let shell = FakeShell::default();
        let store = MemoryMarkerStore::default();
        let migrations = RecordingMigrations::default();
        let reporter = Arc::new(SlowReporter::new(Duration::ZERO));
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            reporter.clone(),
            &migrations,
        );

        let err = orchestrator
            .deploy(STAG, &inputs("build-5", None), &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::VersionQuery);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(shell.scripts().is_empty());
        assert!(reporter.messages().is_empty());
        assert!(store.get(STAG).is_none());
    }

    #[tokio::test]
    async fn version_query_failure_leaves_the_marker_unread() {
        let config = config();
        let source = FakeSource::failing();
        let shell = FakeShell::default();
        let store = MemoryMarkerStore {
            corrupt: true,
            ..Default::default()
        };
        let migrations = RecordingMigrations::default();
        let orchestrator = Orchestrator::new(
            &config,
            &source,
            &shell,
            &store,
            Arc::new(SlowReporter::new(Duration::ZERO)),
            &migrations,
        );
        let mut diag = Diagnostics::default();

        let err = orchestrator
            .plan(STAG, &inputs("build-5", None), &mut diag)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::VersionQuery);
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert_eq!(diag.count(WarningKind::MarkerUnreadable), 0);
    }
}
