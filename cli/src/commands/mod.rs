//! Command implementations

pub mod create;
pub mod delete;
pub mod exec;
pub mod image;
pub mod info;
pub mod logs;
pub mod start;
pub mod stop;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use berth_common::Project;

/// Load a project descriptor from a JSON file.
pub fn load_project(path: &Path) -> Result<Project> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading project descriptor {}", path.display()))?;
    let project: Project = serde_json::from_str(&raw)
        .with_context(|| format!("parsing project descriptor {}", path.display()))?;
    project.validate()?;
    Ok(project)
}

/// Root under which project source trees are materialized:
/// `$BERTH_PROJECTS_DIR` or `/var/lib/berth/projects`.
#[must_use]
pub fn projects_root() -> PathBuf {
    std::env::var_os("BERTH_PROJECTS_DIR")
        .map_or_else(|| PathBuf::from("/var/lib/berth/projects"), PathBuf::from)
}

/// The host directory holding one project's cloned sources.
#[must_use]
pub fn project_dir(project: &Project) -> PathBuf {
    projects_root().join(crate::domain::names::container_name(
        &project.workspace_id,
        &project.name,
    ))
}
