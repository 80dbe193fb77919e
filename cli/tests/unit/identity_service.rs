//! Tests for UID/GID reconciliation.

#![allow(clippy::expect_used)]

use berth_common::ExecResult;
use berth_cli::application::ports::Identity;
use berth_cli::application::services::identity;
use berth_cli::domain::scripts::UID_COLLISION_EXIT;

use crate::mocks::{FakeRuntime, RecordingReporter, running_container};

#[tokio::test]
async fn root_identity_requires_no_remap() {
    let runtime = FakeRuntime::new();
    let reporter = RecordingReporter::new();

    identity::reconcile(&runtime, "ws1-api", "dev", Identity::ROOT, &reporter)
        .await
        .expect("root reconcile should be a no-op");

    assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn remap_runs_as_root_with_generated_script() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container("ws1-api", &[]));
    let reporter = RecordingReporter::new();

    identity::reconcile(
        &runtime,
        "ws1-api",
        "dev",
        Identity {
            uid: 1000,
            gid: 1000,
        },
        &reporter,
    )
    .await
    .expect("remap should succeed");

    let state = runtime.state.lock().expect("lock");
    let (_, exec) = state.execs.first().expect("remap exec");
    assert_eq!(exec.user.as_deref(), Some("root"));
    assert!(exec.cmd[2].contains("usermod -u 1000"));
}

#[tokio::test]
async fn uid_collision_is_a_warning_not_a_failure() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container("ws1-api", &[]));
    runtime
        .state
        .lock()
        .expect("lock")
        .exec_results
        .push_back(ExecResult {
            exit_code: UID_COLLISION_EXIT,
            stdout: Vec::new(),
            stderr: b"uid 1000 is already claimed by account 'node'".to_vec(),
        });
    let reporter = RecordingReporter::new();

    identity::reconcile(
        &runtime,
        "ws1-api",
        "dev",
        Identity {
            uid: 1000,
            gid: 1000,
        },
        &reporter,
    )
    .await
    .expect("collision should not fail the flow");

    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("already claimed"));
}

#[tokio::test]
async fn other_failures_abort_the_flow() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container("ws1-api", &[]));
    runtime
        .state
        .lock()
        .expect("lock")
        .exec_results
        .push_back(ExecResult {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: b"usermod: command not found".to_vec(),
        });
    let reporter = RecordingReporter::new();

    let err = identity::reconcile(
        &runtime,
        "ws1-api",
        "dev",
        Identity {
            uid: 1000,
            gid: 1000,
        },
        &reporter,
    )
    .await
    .expect_err("non-collision failures are fatal");

    assert!(err.to_string().contains("status 1"));
}
