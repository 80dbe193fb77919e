use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating workspace and project descriptors.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid workspace id '{0}': must match ^[a-z0-9]([a-z0-9-]{{0,61}}[a-z0-9])?$")]
    InvalidWorkspaceId(String),

    #[error("Invalid project name '{0}': must match ^[a-z0-9]([a-z0-9-]{{0,61}}[a-z0-9])?$")]
    InvalidProjectName(String),

    #[error("Project '{0}' has no image and no devcontainer build to fall back to")]
    NoBuildSource(String),
}

/// A named grouping of projects sharing one isolated network.
///
/// The network is named exactly after `id` and is created when the first
/// project is provisioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// One development environment definition inside a workspace.
///
/// A project maps 1:1 to a primary container named `{workspace_id}-{name}`;
/// docker-compose-based devcontainer builds may add sibling containers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub workspace_id: String,
    pub repository: Repository,
    /// Container image used on the image build path and for helper containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Build strategy. Absent means [`BuildSpec::Auto`].
    #[serde(default)]
    pub build: BuildSpec,
    /// Environment injected into the project container. Overrides any
    /// defaults carried by a devcontainer configuration on key collision.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    /// In-container user the environment runs as.
    pub user: String,
    /// API key handed to the workspace agent at bootstrap.
    #[serde(default)]
    pub api_key: String,
}

/// Source repository for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
}

/// How a project's primary container is materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "strategy")]
pub enum BuildSpec {
    /// Probe the cloned tree for a devcontainer configuration, falling back
    /// to the plain image when none is found.
    #[default]
    Auto,
    /// Use the project image as-is.
    Image,
    /// Build through the devcontainer tool. `config_path` is relative to the
    /// repository root; when absent the conventional locations are probed.
    Devcontainer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config_path: Option<String>,
    },
}

/// Point-in-time view of a project's primary container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub is_running: bool,
    /// Creation timestamp as reported by the container runtime (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// Point-in-time view of a workspace: one entry per project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub projects: Vec<ProjectInfo>,
}

/// Captured result of one synchronous in-container command.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

fn is_valid_identifier(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    let inner_ok = bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    inner_ok && edge_ok(bytes[0]) && edge_ok(bytes[bytes.len() - 1])
}

/// Validate a workspace id.
///
/// Ids become network and container name components, so the charset is the
/// DNS-label subset every container runtime accepts.
pub fn validate_workspace_id(id: &str) -> Result<(), DescriptorError> {
    if is_valid_identifier(id) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidWorkspaceId(id.to_string()))
    }
}

/// Validate a project name. Same charset rules as workspace ids.
pub fn validate_project_name(name: &str) -> Result<(), DescriptorError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidProjectName(name.to_string()))
    }
}

impl Project {
    /// Validate the descriptor before any runtime call is made with it.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_workspace_id(&self.workspace_id)?;
        validate_project_name(&self.name)?;
        if self.image.is_none() && self.build == BuildSpec::Image {
            return Err(DescriptorError::NoBuildSource(self.name.clone()));
        }
        Ok(())
    }
}
