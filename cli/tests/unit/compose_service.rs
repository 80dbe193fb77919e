//! Tests for compose sibling discovery and lifecycle.

#![allow(clippy::expect_used)]

use berth_cli::application::ports::ContainerDetails;
use berth_cli::application::services::compose;
use berth_cli::domain::names::LABEL_COMPOSE_PROJECT;

use crate::mocks::{FakeRuntime, RecordingReporter, running_container};

fn primary_with_label(runtime: &FakeRuntime, label: Option<&str>) -> ContainerDetails {
    let labels = label.map_or_else(Vec::new, |l| vec![(LABEL_COMPOSE_PROJECT, l)]);
    let container = running_container("ws1-api", &labels);
    let details = ContainerDetails {
        id: container.id.clone(),
        name: container.name.clone(),
        running: true,
        created: None,
        labels: container.labels.clone(),
    };
    runtime.seed_container(container);
    details
}

#[tokio::test]
async fn discovery_returns_none_without_compose_label() {
    let runtime = FakeRuntime::new();
    let primary = primary_with_label(&runtime, None);

    let discovered = compose::discover(&runtime, &primary)
        .await
        .expect("discovery should succeed");
    assert!(discovered.is_none());
}

#[tokio::test]
async fn discovery_lists_siblings_excluding_primary() {
    let runtime = FakeRuntime::new();
    let primary = primary_with_label(&runtime, Some("ws1-api"));
    runtime.seed_container(running_container(
        "ws1-api-db-1",
        &[(LABEL_COMPOSE_PROJECT, "ws1-api")],
    ));
    runtime.seed_container(running_container(
        "ws1-api-cache-1",
        &[(LABEL_COMPOSE_PROJECT, "ws1-api")],
    ));

    let discovered = compose::discover(&runtime, &primary)
        .await
        .expect("discovery should succeed")
        .expect("compose project expected");

    assert_eq!(discovered.label, "ws1-api");
    assert_eq!(discovered.siblings.len(), 2);
    assert!(discovered.siblings.iter().all(|s| s.id != primary.id));
}

#[tokio::test]
async fn remove_all_removes_siblings_and_default_network() {
    let runtime = FakeRuntime::new();
    let primary = primary_with_label(&runtime, Some("ws1-api"));
    runtime.seed_container(running_container(
        "ws1-api-db-1",
        &[(LABEL_COMPOSE_PROJECT, "ws1-api")],
    ));
    runtime
        .state
        .lock()
        .expect("lock")
        .networks
        .push("ws1-api_default".to_string());
    let reporter = RecordingReporter::new();

    let discovered = compose::discover(&runtime, &primary)
        .await
        .expect("discovery should succeed")
        .expect("compose project expected");
    compose::remove_all(&runtime, &discovered, &reporter)
        .await
        .expect("removal should succeed");

    let state = runtime.state.lock().expect("lock");
    assert!(!state.containers.iter().any(|c| c.name == "ws1-api-db-1"));
    assert!(state.networks.is_empty());
}

#[tokio::test]
async fn remove_all_tolerates_already_absent_network() {
    let runtime = FakeRuntime::new();
    let primary = primary_with_label(&runtime, Some("ws1-api"));
    let reporter = RecordingReporter::new();

    let discovered = compose::discover(&runtime, &primary)
        .await
        .expect("discovery should succeed")
        .expect("compose project expected");
    compose::remove_all(&runtime, &discovered, &reporter)
        .await
        .expect("removal with nothing to remove should succeed");
}
