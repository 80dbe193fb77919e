//! Shared mock infrastructure for unit tests.
//!
//! [`FakeRuntime`] is an in-memory container runtime with injectable
//! behaviors (conflicts, wait codes, log-attach failures, exec results) and
//! a call journal so tests can assert on exactly what the services did.

#![allow(clippy::expect_used)]
#![allow(dead_code)] // not every test file uses every knob

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use berth_common::ExecResult;
use berth_cli::application::ports::{
    ContainerDetails, ContainerFilter, ContainerRuntime, ContainerSpec, ContainerSummary,
    ExecSpec, FileReader, ProgressReporter,
};
use berth_cli::domain::error::RuntimeError;

// ── Recording progress reporter ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub logs: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.logs.lock().expect("lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("lock").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.lock().expect("lock").push(message.to_string());
    }

    fn success(&self, _: &str) {}

    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .expect("lock")
            .push(message.to_string());
    }

    fn log(&self, line: &str) {
        self.logs.lock().expect("lock").push(line.to_string());
    }
}

// ── In-memory file reader ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MapFileReader {
    pub files: HashMap<PathBuf, Vec<u8>>,
}

impl MapFileReader {
    pub fn with(files: impl IntoIterator<Item = (PathBuf, Vec<u8>)>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }
}

impl FileReader for MapFileReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }
}

// ── Fake container runtime ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub running: bool,
    pub labels: HashMap<String, String>,
    pub image: String,
}

#[derive(Default)]
pub struct FakeState {
    pub containers: Vec<FakeContainer>,
    pub networks: Vec<String>,
    pub volumes: Vec<String>,
    pub images: Vec<String>,
    /// Journal of every mutating call, e.g. `"create ws1-api"`.
    pub calls: Vec<String>,
    /// Specs of every created container, in order.
    pub created_specs: Vec<ContainerSpec>,
    /// Canned exec results, popped per call. Empty queue yields exit 0.
    pub exec_results: VecDeque<ExecResult>,
    /// Every exec that was issued.
    pub execs: Vec<(String, ExecSpec)>,
    /// Artificial latency before an exec returns.
    pub exec_delay: Option<Duration>,
    /// Exit codes by container name; missing entries exit 0.
    pub wait_codes: HashMap<String, i64>,
    /// Log lines emitted for containers of a given image.
    pub logs_by_image: HashMap<String, Vec<String>>,
    /// Failures to inject before a log attach succeeds, by image.
    pub log_failures_by_image: HashMap<String, u32>,
    /// Names whose creation fails with a conflict while a container of that
    /// name simultaneously appears in listings (a lost creation race).
    pub conflict_names: Vec<String>,
    /// When set, `start_container` does not flip `running`.
    pub start_is_noop: bool,
    next_id: u32,
}

pub struct FakeRuntime {
    pub state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_state(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().expect("lock").calls.clone()
    }

    pub fn created_specs(&self) -> Vec<ContainerSpec> {
        self.state.lock().expect("lock").created_specs.clone()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("lock")
            .containers
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn seed_container(&self, container: FakeContainer) {
        self.state.lock().expect("lock").containers.push(container);
    }

    fn find_index(state: &FakeState, key: &str) -> Option<usize> {
        state
            .containers
            .iter()
            .position(|c| c.id == key || c.name == key)
    }

    fn not_found(operation: &'static str, target: &str) -> RuntimeError {
        RuntimeError::NotFound {
            operation,
            target: target.to_string(),
        }
    }
}

pub fn running_container(name: &str, labels: &[(&str, &str)]) -> FakeContainer {
    FakeContainer {
        id: format!("id-{name}"),
        name: name.to_string(),
        running: true,
        labels: labels
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        image: "img".to_string(),
    }
}

impl ContainerRuntime for FakeRuntime {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.created_specs.push(spec.clone());

        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("anon-{}", state.next_id));
        state.calls.push(format!("create {name}"));

        if state.conflict_names.iter().any(|n| n == &name) {
            // The race winner's container materializes in listings.
            if Self::find_index(&state, &name).is_none() {
                let id = format!("id-race-{name}");
                state.containers.push(FakeContainer {
                    id,
                    name: name.clone(),
                    running: true,
                    labels: spec.labels.clone(),
                    image: spec.image.clone(),
                });
            }
            return Err(RuntimeError::Conflict {
                operation: "create container",
                target: name,
            });
        }

        if Self::find_index(&state, &name).is_some() {
            return Err(RuntimeError::Conflict {
                operation: "create container",
                target: name,
            });
        }

        state.next_id += 1;
        let id = format!("id-{}-{}", state.next_id, name);
        state.containers.push(FakeContainer {
            id: id.clone(),
            name,
            running: false,
            labels: spec.labels.clone(),
            image: spec.image.clone(),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        let noop = state.start_is_noop;
        let Some(idx) = Self::find_index(&state, id) else {
            return Err(Self::not_found("start container", id));
        };
        let name = state.containers[idx].name.clone();
        state.calls.push(format!("start {name}"));
        if !noop {
            state.containers[idx].running = true;
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        let Some(idx) = Self::find_index(&state, id) else {
            return Err(Self::not_found("stop container", id));
        };
        state.containers[idx].running = false;
        let name = state.containers[idx].name.clone();
        state.calls.push(format!("stop {name}"));
        Ok(())
    }

    async fn remove_container(
        &self,
        id: &str,
        _force: bool,
        _remove_volumes: bool,
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        let Some(idx) = Self::find_index(&state, id) else {
            return Err(Self::not_found("remove container", id));
        };
        let removed = state.containers.remove(idx);
        state.calls.push(format!("remove {}", removed.name));
        Ok(())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let state = self.state.lock().expect("lock");
        let Some(idx) = Self::find_index(&state, id) else {
            return Err(Self::not_found("inspect container", id));
        };
        let c = &state.containers[idx];
        Ok(ContainerDetails {
            id: c.id.clone(),
            name: c.name.clone(),
            running: c.running,
            created: Some("2026-01-01T00:00:00Z".to_string()),
            labels: c.labels.clone(),
        })
    }

    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .containers
            .iter()
            .filter(|c| {
                filter
                    .name
                    .as_ref()
                    .is_none_or(|name| c.name.contains(name.as_str()))
            })
            .filter(|c| {
                filter.label.as_ref().is_none_or(|label| {
                    label
                        .split_once('=')
                        .is_some_and(|(k, v)| c.labels.get(k).is_some_and(|have| have == v))
                })
            })
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                names: vec![c.name.clone()],
                labels: c.labels.clone(),
            })
            .collect())
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        let Some(idx) = Self::find_index(&state, id) else {
            return Err(Self::not_found("wait container", id));
        };
        state.containers[idx].running = false;
        let name = state.containers[idx].name.clone();
        state.calls.push(format!("wait {name}"));
        Ok(state.wait_codes.get(&name).copied().unwrap_or(0))
    }

    async fn container_logs(
        &self,
        id: &str,
        _follow: bool,
        sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let image = {
            let state = self.state.lock().expect("lock");
            let Some(idx) = Self::find_index(&state, id) else {
                return Err(Self::not_found("stream container logs", id));
            };
            state.containers[idx].image.clone()
        };

        {
            let mut state = self.state.lock().expect("lock");
            if let Some(failures) = state.log_failures_by_image.get_mut(&image) {
                if *failures > 0 {
                    *failures -= 1;
                    return Err(RuntimeError::Api {
                        operation: "stream container logs",
                        target: id.to_string(),
                        message: "stream not yet attachable".to_string(),
                    });
                }
            }
        }

        let lines = {
            let state = self.state.lock().expect("lock");
            state.logs_by_image.get(&image).cloned().unwrap_or_default()
        };
        for line in lines {
            sink.log(&line);
        }
        Ok(())
    }

    async fn exec(
        &self,
        container: &str,
        spec: &ExecSpec,
        sink: &dyn ProgressReporter,
    ) -> Result<ExecResult, RuntimeError> {
        let delay = {
            let mut state = self.state.lock().expect("lock");
            if Self::find_index(&state, container).is_none() {
                return Err(Self::not_found("create exec", container));
            }
            state.execs.push((container.to_string(), spec.clone()));
            state.calls.push(format!("exec {container}"));
            state.exec_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock().expect("lock");
            state.exec_results.pop_front().unwrap_or_default()
        };
        for line in String::from_utf8_lossy(&result.stdout).lines() {
            sink.log(line);
        }
        Ok(result)
    }

    async fn create_network(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("create-network {name}"));
        if state.networks.iter().any(|n| n == name) {
            return Err(RuntimeError::Conflict {
                operation: "create network",
                target: name.to_string(),
            });
        }
        state.networks.push(name.to_string());
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("remove-network {name}"));
        let Some(idx) = state.networks.iter().position(|n| n == name) else {
            return Err(Self::not_found("remove network", name));
        };
        state.networks.remove(idx);
        Ok(())
    }

    async fn network_exists(&self, name: &str) -> Result<bool, RuntimeError> {
        let state = self.state.lock().expect("lock");
        Ok(state.networks.iter().any(|n| n == name))
    }

    async fn create_volume(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("create-volume {name}"));
        state.volumes.push(name.to_string());
        Ok(())
    }

    async fn remove_volume(&self, name: &str, _force: bool) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("remove-volume {name}"));
        let Some(idx) = state.volumes.iter().position(|n| n == name) else {
            return Err(Self::not_found("remove volume", name));
        };
        state.volumes.remove(idx);
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
        let state = self.state.lock().expect("lock");
        Ok(state.images.iter().any(|i| i == image))
    }

    async fn pull_image(
        &self,
        image: &str,
        _sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("pull {image}"));
        state.images.push(image.to_string());
        Ok(())
    }

    async fn push_image(
        &self,
        image: &str,
        _sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("push {image}"));
        Ok(())
    }
}
