//! Deterministic naming for every runtime resource berth owns.
//!
//! All durable state lives in the container runtime, addressed by names
//! derived from the workspace id and project name. Centralizing the scheme
//! here keeps lookup and idempotent re-creation in agreement.

use std::path::Path;

/// Label carrying the owning workspace id on every project container.
pub const LABEL_WORKSPACE_ID: &str = "berth.workspace.id";

/// Label carrying the project name on every project container.
pub const LABEL_PROJECT_NAME: &str = "berth.project.name";

/// Label carrying the clone URL on every project container.
pub const LABEL_REPOSITORY_URL: &str = "berth.project.repository.url";

/// Label docker-compose stamps on every container of a compose project.
/// Compose siblings are discovered through it, never cached.
pub const LABEL_COMPOSE_PROJECT: &str = "com.docker.compose.project";

/// Well-known name of the process-wide socket-forward proxy container.
pub const SOCK_FORWARD_CONTAINER: &str = "berth-sock-forward";

/// Image run by the socket-forward proxy.
pub const SOCK_FORWARD_IMAGE: &str = "alpine/socat";

/// TCP port the proxy listens on; build containers reach the host runtime
/// socket through `tcp://localhost:{SOCK_FORWARD_PORT}`.
pub const SOCK_FORWARD_PORT: u16 = 2375;

/// Image used for the repository clone helper.
pub const CLONE_IMAGE: &str = "alpine/git";

/// Image carrying the devcontainer CLI, used for read-configuration and
/// build helper containers.
pub const HELPER_IMAGE: &str = "berthhq/workspace-project";

/// The project's primary container: `{workspace_id}-{name}`.
#[must_use]
pub fn container_name(workspace_id: &str, project_name: &str) -> String {
    format!("{workspace_id}-{project_name}")
}

/// The project's dedicated volume shares the container's name.
#[must_use]
pub fn volume_name(workspace_id: &str, project_name: &str) -> String {
    container_name(workspace_id, project_name)
}

/// The workspace network is named exactly after the workspace id.
#[must_use]
pub fn network_name(workspace_id: &str) -> String {
    workspace_id.to_string()
}

/// Default network docker-compose creates for a compose project.
#[must_use]
pub fn compose_default_network(project_label: &str) -> String {
    format!("{project_label}_default")
}

/// Where helper containers see the project directory: `/workdir/{basename}`.
#[must_use]
pub fn mount_target(project_dir: &Path) -> String {
    let base = project_dir
        .file_name()
        .map_or_else(|| "project".to_string(), |n| n.to_string_lossy().into_owned());
    format!("/workdir/{base}")
}
