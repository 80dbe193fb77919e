//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `berth_common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use berth_common::ExecResult;

use crate::domain::error::RuntimeError;

// ── Value Types ───────────────────────────────────────────────────────────────

/// A host path bind-mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: String,
    pub target: String,
}

impl BindMount {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Everything needed to create one container.
///
/// `name: None` lets the runtime pick; helper containers that must not clash
/// pass a generated unique name instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: Option<String>,
    pub image: String,
    pub entrypoint: Option<Vec<String>>,
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub user: Option<String>,
    pub hostname: Option<String>,
    pub labels: HashMap<String, String>,
    pub privileged: bool,
    /// Network mode: a network name, or `container:{id}` to share another
    /// container's namespace.
    pub network_mode: Option<String>,
    pub extra_hosts: Vec<String>,
    pub binds: Vec<BindMount>,
    pub tty: bool,
}

impl ContainerSpec {
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }
}

/// One row of a container listing.
#[derive(Debug, Clone, Default)]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// Inspect view of a single container.
#[derive(Debug, Clone, Default)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub running: bool,
    /// Creation timestamp as reported by the runtime (RFC 3339).
    pub created: Option<String>,
    pub labels: HashMap<String, String>,
}

/// Name/label filter for container listings. Listings always include
/// stopped containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilter {
    pub name: Option<String>,
    /// `key=value` label filter.
    pub label: Option<String>,
}

impl ContainerFilter {
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            label: None,
        }
    }

    #[must_use]
    pub fn by_label(key: &str, value: &str) -> Self {
        Self {
            name: None,
            label: Some(format!("{key}={value}")),
        }
    }
}

/// One synchronous command executed inside a running container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecSpec {
    pub cmd: Vec<String>,
    /// User to run as; `None` keeps the container's configured user.
    pub user: Option<String>,
}

// ── Container Runtime Port ────────────────────────────────────────────────────

/// The external container runtime collaborator.
///
/// Errors are typed so callers can recognize `NotFound` (treated as success
/// by every destructive step) and `Conflict` (name already taken) without
/// string matching.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Create a container and return its id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;
    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;
    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;
    async fn remove_container(
        &self,
        id: &str,
        force: bool,
        remove_volumes: bool,
    ) -> Result<(), RuntimeError>;
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError>;
    /// Block until the container's next exit and return its exit code.
    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError>;
    /// Stream container output into `sink`, demultiplexed line by line.
    /// With `follow`, blocks until the container stops producing output.
    async fn container_logs(
        &self,
        id: &str,
        follow: bool,
        sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError>;
    /// Execute a command to completion, mirroring output into `sink`.
    async fn exec(
        &self,
        container: &str,
        spec: &ExecSpec,
        sink: &dyn ProgressReporter,
    ) -> Result<ExecResult, RuntimeError>;

    async fn create_network(&self, name: &str) -> Result<(), RuntimeError>;
    async fn remove_network(&self, name: &str) -> Result<(), RuntimeError>;
    async fn network_exists(&self, name: &str) -> Result<bool, RuntimeError>;

    async fn create_volume(&self, name: &str) -> Result<(), RuntimeError>;
    async fn remove_volume(&self, name: &str, force: bool) -> Result<(), RuntimeError>;

    async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError>;
    async fn pull_image(&self, image: &str, sink: &dyn ProgressReporter)
    -> Result<(), RuntimeError>;
    async fn push_image(&self, image: &str, sink: &dyn ProgressReporter)
    -> Result<(), RuntimeError>;
}

// ── File Access Port ──────────────────────────────────────────────────────────

/// Reads file bytes from the project source tree — local filesystem or a
/// remote session, indistinguishable to callers beyond the failure mode.
#[allow(async_fn_in_trait)]
pub trait FileReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

// ── Caller Identity Port ──────────────────────────────────────────────────────

/// A UID/GID pair describing the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

impl Identity {
    pub const ROOT: Self = Self { uid: 0, gid: 0 };

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.uid == 0 && self.gid == 0
    }
}

/// Resolves the caller's identity from the local OS user context or from a
/// remote session lookup.
#[allow(async_fn_in_trait)]
pub trait IdentitySource {
    async fn current_identity(&self) -> Result<Identity>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
///
/// Every lifecycle step writes progress before it can fail, so partial
/// progress is observable even when an operation aborts.
pub trait ProgressReporter: Send + Sync {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit one line of raw container or tool output.
    fn log(&self, line: &str);
}
