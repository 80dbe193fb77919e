//! Tests for the lifecycle controller service.

#![allow(clippy::expect_used)]

use std::time::Duration;

use berth_common::BuildSpec;
use berth_cli::application::services::agent::AgentBootstrap;
use berth_cli::application::services::lifecycle::{self, PollConfig};
use berth_cli::domain::error::RuntimeError;
use berth_cli::domain::names::{
    CLONE_IMAGE, HELPER_IMAGE, LABEL_PROJECT_NAME, LABEL_WORKSPACE_ID,
};

use crate::helpers::{image_project, root_identity};
use crate::mocks::{FakeRuntime, MapFileReader, RecordingReporter, running_container};

fn bootstrap() -> AgentBootstrap {
    AgentBootstrap::new("https://get.berth.dev/agent")
}

#[tokio::test]
async fn create_produces_exactly_one_deterministically_named_container() {
    let runtime = FakeRuntime::new();
    let reporter = RecordingReporter::new();
    let project = image_project();
    let dir = tempfile::tempdir().expect("tempdir");
    let project_dir = dir.path().join("ws1-api");
    std::fs::create_dir_all(&project_dir).expect("mkdir");

    lifecycle::create_project(
        &runtime,
        &MapFileReader::default(),
        &root_identity(),
        &project,
        &project_dir,
        &reporter,
    )
    .await
    .expect("create should succeed");

    // The clone helper is gone; only the primary container remains.
    assert_eq!(runtime.container_names(), vec!["ws1-api".to_string()]);

    let state = runtime.state.lock().expect("lock");
    assert!(state.networks.contains(&"ws1".to_string()));
    let primary = state
        .containers
        .iter()
        .find(|c| c.name == "ws1-api")
        .expect("primary container");
    assert_eq!(primary.labels.get(LABEL_WORKSPACE_ID).map(String::as_str), Some("ws1"));
    assert_eq!(primary.labels.get(LABEL_PROJECT_NAME).map(String::as_str), Some("api"));
    assert_eq!(primary.image, "alpine:3.19");
}

#[tokio::test]
async fn create_takes_image_path_when_no_devcontainer_detected() {
    let runtime = FakeRuntime::new();
    let reporter = RecordingReporter::new();
    let mut project = image_project();
    project.build = BuildSpec::Auto;
    let dir = tempfile::tempdir().expect("tempdir");
    let project_dir = dir.path().join("ws1-api");
    std::fs::create_dir_all(&project_dir).expect("mkdir");

    lifecycle::create_project(
        &runtime,
        &MapFileReader::default(),
        &root_identity(),
        &project,
        &project_dir,
        &reporter,
    )
    .await
    .expect("create should succeed");

    // No build-tool helper ran, only the clone helper and the primary.
    let specs = runtime.created_specs();
    assert!(specs.iter().any(|s| s.image == CLONE_IMAGE));
    assert!(!specs.iter().any(|s| s.image == HELPER_IMAGE));
    assert!(specs.iter().any(|s| s.image == "alpine:3.19"));
}

#[tokio::test]
async fn create_is_idempotent_when_container_already_exists() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container("ws1-api", &[]));
    let reporter = RecordingReporter::new();
    let project = image_project();
    let dir = tempfile::tempdir().expect("tempdir");
    let project_dir = dir.path().join("ws1-api");
    std::fs::create_dir_all(&project_dir).expect("mkdir");

    lifecycle::create_project(
        &runtime,
        &MapFileReader::default(),
        &root_identity(),
        &project,
        &project_dir,
        &reporter,
    )
    .await
    .expect("re-create over an existing container should succeed");
}

#[tokio::test]
async fn start_transitions_container_to_running_and_launches_agent() {
    let runtime = FakeRuntime::new();
    let mut container = running_container(
        "ws1-api",
        &[(LABEL_WORKSPACE_ID, "ws1"), (LABEL_PROJECT_NAME, "api")],
    );
    container.running = false;
    runtime.seed_container(container);
    let reporter = RecordingReporter::new();
    let project = image_project();

    lifecycle::start_project(
        &runtime,
        &root_identity(),
        &project,
        &bootstrap(),
        &PollConfig::default(),
        &reporter,
    )
    .await
    .expect("start should succeed");

    let state = runtime.state.lock().expect("lock");
    assert!(state.containers[0].running);
    let (container, exec) = state.execs.first().expect("agent exec");
    assert_eq!(container, "id-ws1-api");
    assert_eq!(exec.user.as_deref(), Some("dev"));
    assert!(exec.cmd[2].contains("BERTH_API_KEY"));
}

#[tokio::test]
async fn start_skips_container_start_when_already_running() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container(
        "ws1-api",
        &[(LABEL_WORKSPACE_ID, "ws1"), (LABEL_PROJECT_NAME, "api")],
    ));
    let reporter = RecordingReporter::new();
    let project = image_project();

    lifecycle::start_project(
        &runtime,
        &root_identity(),
        &project,
        &bootstrap(),
        &PollConfig::default(),
        &reporter,
    )
    .await
    .expect("start should succeed");

    let calls = runtime.calls();
    assert!(!calls.iter().any(|c| c == "start ws1-api"));
    assert!(calls.iter().any(|c| c.starts_with("exec ")));
}

#[tokio::test]
async fn start_times_out_with_distinct_error_kind() {
    let runtime = FakeRuntime::new();
    let mut container = running_container("ws1-api", &[]);
    container.running = false;
    runtime.seed_container(container);
    runtime.state.lock().expect("lock").start_is_noop = true;
    let reporter = RecordingReporter::new();
    let project = image_project();

    let poll = PollConfig {
        deadline: Duration::from_millis(30),
        interval: Duration::from_millis(5),
    };
    let err = lifecycle::start_project(
        &runtime,
        &root_identity(),
        &project,
        &bootstrap(),
        &poll,
        &reporter,
    )
    .await
    .expect_err("start should time out");

    let runtime_err = err
        .downcast_ref::<RuntimeError>()
        .expect("timeout should surface as a RuntimeError");
    assert!(matches!(runtime_err, RuntimeError::Timeout { .. }));
}

#[tokio::test]
async fn stop_is_a_no_op_when_container_absent() {
    let runtime = FakeRuntime::new();
    let reporter = RecordingReporter::new();
    let project = image_project();

    lifecycle::stop_project(&runtime, &project, &reporter)
        .await
        .expect("stopping a missing project should succeed");
}

#[tokio::test]
async fn destroy_twice_succeeds_and_removes_container_and_volume() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container(
        "ws1-api",
        &[(LABEL_WORKSPACE_ID, "ws1"), (LABEL_PROJECT_NAME, "api")],
    ));
    runtime
        .state
        .lock()
        .expect("lock")
        .volumes
        .push("ws1-api".to_string());
    let reporter = RecordingReporter::new();
    let project = image_project();

    lifecycle::destroy_project(&runtime, &project, &reporter)
        .await
        .expect("first destroy should succeed");

    {
        let state = runtime.state.lock().expect("lock");
        assert!(state.containers.is_empty());
        assert!(state.volumes.is_empty());
    }

    lifecycle::destroy_project(&runtime, &project, &reporter)
        .await
        .expect("second destroy should also succeed");
}

#[tokio::test]
async fn destroy_workspace_tolerates_missing_network() {
    let runtime = FakeRuntime::new();
    let reporter = RecordingReporter::new();

    lifecycle::destroy_workspace(&runtime, "ws1", &reporter)
        .await
        .expect("destroying an absent workspace network should succeed");
}

#[tokio::test]
async fn container_name_prefers_label_lookup_over_convention() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container(
        "devcontainer-generated-name",
        &[(LABEL_WORKSPACE_ID, "ws1"), (LABEL_PROJECT_NAME, "api")],
    ));
    let project = image_project();

    let name = lifecycle::project_container_name(&runtime, &project).await;
    assert_eq!(name, "id-devcontainer-generated-name");
}

#[tokio::test]
async fn container_name_falls_back_to_deterministic_name() {
    let runtime = FakeRuntime::new();
    let project = image_project();

    let name = lifecycle::project_container_name(&runtime, &project).await;
    assert_eq!(name, "ws1-api");
    assert_eq!(lifecycle::project_volume_name(&project), "ws1-api");
}

#[tokio::test]
async fn workspace_info_aggregates_project_states() {
    let runtime = FakeRuntime::new();
    runtime.seed_container(running_container(
        "ws1-api",
        &[(LABEL_WORKSPACE_ID, "ws1"), (LABEL_PROJECT_NAME, "api")],
    ));
    let workspace = berth_common::Workspace {
        id: "ws1".to_string(),
        projects: vec![image_project()],
    };

    let info = lifecycle::workspace_info(&runtime, &workspace)
        .await
        .expect("info should succeed");

    assert_eq!(info.id, "ws1");
    assert_eq!(info.projects.len(), 1);
    assert!(info.projects[0].is_running);
    assert!(info.projects[0].created.is_some());
}

#[tokio::test]
async fn pull_skips_when_image_present() {
    let runtime = FakeRuntime::new();
    runtime
        .state
        .lock()
        .expect("lock")
        .images
        .push("alpine:3.19".to_string());
    let reporter = RecordingReporter::new();

    lifecycle::pull_image(&runtime, "alpine:3.19", &reporter)
        .await
        .expect("pull should succeed");
    assert!(!runtime.calls().iter().any(|c| c == "pull alpine:3.19"));
}
