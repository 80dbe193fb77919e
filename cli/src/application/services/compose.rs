//! Application service — compose sibling container management.
//!
//! A docker-compose-based devcontainer build creates containers beside the
//! primary one, linked by the compose project label. Siblings are created by
//! the external build tool outside our control, so discovery always reads
//! runtime state on demand instead of caching.

use anyhow::{Context, Result};

use crate::application::ports::{
    ContainerDetails, ContainerFilter, ContainerRuntime, ContainerSummary, ProgressReporter,
};
use crate::domain::error::RuntimeError;
use crate::domain::names::{LABEL_COMPOSE_PROJECT, compose_default_network};

/// A discovered compose project: its label and the sibling containers.
#[derive(Debug, Clone)]
pub struct ComposeProject {
    pub label: String,
    pub siblings: Vec<ContainerSummary>,
}

/// Inspect the primary container's compose project label and list its
/// siblings. A missing label is the common single-container case, not an
/// error.
pub async fn discover(
    runtime: &impl ContainerRuntime,
    primary: &ContainerDetails,
) -> Result<Option<ComposeProject>> {
    let Some(label) = primary.labels.get(LABEL_COMPOSE_PROJECT) else {
        return Ok(None);
    };

    let members = runtime
        .list_containers(&ContainerFilter::by_label(LABEL_COMPOSE_PROJECT, label))
        .await
        .context("listing compose project containers")?;

    let siblings = members
        .into_iter()
        .filter(|c| c.id != primary.id)
        .collect();

    Ok(Some(ComposeProject {
        label: label.clone(),
        siblings,
    }))
}

/// Start every sibling, reporting each as it comes up.
pub async fn start_all(
    runtime: &impl ContainerRuntime,
    project: &ComposeProject,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    for sibling in &project.siblings {
        runtime
            .start_container(&sibling.id)
            .await
            .with_context(|| format!("starting compose container {}", display_name(sibling)))?;
        reporter.log(&format!("Started {}", display_name(sibling)));
    }
    Ok(())
}

/// Stop every sibling. Absent containers are already stopped.
pub async fn stop_all(
    runtime: &impl ContainerRuntime,
    project: &ComposeProject,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    for sibling in &project.siblings {
        tolerate_not_found(runtime.stop_container(&sibling.id).await)
            .with_context(|| format!("stopping compose container {}", display_name(sibling)))?;
        reporter.log(&format!("Stopped {}", display_name(sibling)));
    }
    Ok(())
}

/// Remove every sibling and the compose-managed default network. Every
/// removal treats not-found as already satisfied.
pub async fn remove_all(
    runtime: &impl ContainerRuntime,
    project: &ComposeProject,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    for sibling in &project.siblings {
        tolerate_not_found(runtime.remove_container(&sibling.id, true, true).await)
            .with_context(|| format!("removing compose container {}", display_name(sibling)))?;
        reporter.log(&format!("Removed {}", display_name(sibling)));
    }

    let network = compose_default_network(&project.label);
    tolerate_not_found(runtime.remove_network(&network).await)
        .with_context(|| format!("removing compose network {network}"))?;

    Ok(())
}

fn tolerate_not_found(result: Result<(), RuntimeError>) -> Result<(), RuntimeError> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}

fn display_name(container: &ContainerSummary) -> &str {
    container
        .names
        .first()
        .map_or(container.id.as_str(), |n| n.trim_start_matches('/'))
}
