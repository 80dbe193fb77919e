//! Build-path selection for a project.
//!
//! The decision of image-based vs. devcontainer-based builds is pure: an
//! explicit [`BuildSpec`] always wins, and `Auto` probes the conventional
//! config locations inside the cloned tree.

use std::path::Path;

use berth_common::BuildSpec;

/// Conventional devcontainer configuration locations, probed in order.
pub const DETECT_CANDIDATES: [&str; 2] = [".devcontainer/devcontainer.json", ".devcontainer.json"];

/// Probe the cloned repository tree for a devcontainer configuration.
///
/// Returns the path relative to `project_dir`, or `None` when the project
/// should fall back to the plain image path.
#[must_use]
pub fn detect_devcontainer(project_dir: &Path) -> Option<String> {
    DETECT_CANDIDATES
        .iter()
        .find(|candidate| project_dir.join(candidate).is_file())
        .map(|candidate| (*candidate).to_string())
}

/// The build path a project will take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildPath {
    /// Pull the project image and create the container directly.
    Image,
    /// Run the devcontainer tool against the configuration at this path
    /// (relative to the project directory).
    Devcontainer(String),
}

/// Resolve the effective build path for a project whose sources live at
/// `project_dir`.
#[must_use]
pub fn resolve_build_path(spec: &BuildSpec, project_dir: &Path) -> BuildPath {
    match spec {
        BuildSpec::Image => BuildPath::Image,
        BuildSpec::Devcontainer {
            config_path: Some(path),
        } => BuildPath::Devcontainer(path.clone()),
        BuildSpec::Devcontainer { config_path: None } | BuildSpec::Auto => {
            detect_devcontainer(project_dir).map_or(BuildPath::Image, BuildPath::Devcontainer)
        }
    }
}
