//! Application service — the project lifecycle controller.
//!
//! Create → Start → Stop → Destroy for workspaces (a shared network) and
//! projects (one or more containers). All I/O is routed through injected
//! port traits; any step failure aborts the remaining steps with the state
//! left as-is, and every destructive step treats not-found as already done,
//! so the same operation can be retried after a partial failure.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use berth_common::{ExecResult, Project, ProjectInfo, Workspace, WorkspaceInfo};
use tracing::info;

use crate::application::ports::{
    BindMount, ContainerFilter, ContainerRuntime, ContainerSpec, ExecSpec, FileReader,
    IdentitySource, ProgressReporter,
};
use crate::application::services::agent::AgentBootstrap;
use crate::application::services::{agent, compose, devcontainer, identity, task_runner};
use crate::domain::buildspec::{BuildPath, resolve_build_path};
use crate::domain::error::RuntimeError;
use crate::domain::names::{
    CLONE_IMAGE, LABEL_PROJECT_NAME, LABEL_REPOSITORY_URL, LABEL_WORKSPACE_ID, container_name,
    network_name, volume_name,
};
use crate::domain::scripts::clone_script;

/// Bounded polling for container state transitions.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub deadline: Duration,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            interval: Duration::from_secs(1),
        }
    }
}

// ── Workspace lifecycle ───────────────────────────────────────────────────────

/// Ensure the workspace's isolated network exists. Safe to call for every
/// project provisioned into it.
pub async fn create_workspace(
    runtime: &impl ContainerRuntime,
    workspace_id: &str,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    berth_common::validate_workspace_id(workspace_id)?;
    let network = network_name(workspace_id);

    if runtime
        .network_exists(&network)
        .await
        .context("checking workspace network")?
    {
        return Ok(());
    }

    reporter.step(&format!("creating workspace network '{network}'..."));
    match runtime.create_network(&network).await {
        Ok(()) => Ok(()),
        // A concurrent provision won the creation race.
        Err(err) if err.is_conflict() => Ok(()),
        Err(err) => Err(err).context("creating workspace network"),
    }
}

/// Remove the workspace network. Absence is not an error.
pub async fn destroy_workspace(
    runtime: &impl ContainerRuntime,
    workspace_id: &str,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let network = network_name(workspace_id);
    reporter.step(&format!("removing workspace network '{network}'..."));
    tolerate_not_found(runtime.remove_network(&network).await)
        .context("removing workspace network")?;
    reporter.success("workspace removed");
    Ok(())
}

// ── Project lifecycle ─────────────────────────────────────────────────────────

/// Provision a project: clone its repository, then build its primary
/// container along the image or devcontainer path.
pub async fn create_project(
    runtime: &impl ContainerRuntime,
    files: &impl FileReader,
    identity_source: &impl IdentitySource,
    project: &Project,
    project_dir: &Path,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    project.validate()?;
    create_workspace(runtime, &project.workspace_id, reporter).await?;

    clone_repository(runtime, identity_source, project, project_dir, reporter).await?;

    match resolve_build_path(&project.build, project_dir) {
        BuildPath::Devcontainer(config_path) => {
            let resolved = devcontainer::build(
                runtime,
                files,
                &devcontainer::DevcontainerOptions {
                    project,
                    project_dir,
                    config_path: &config_path,
                    prebuild: true,
                },
                reporter,
            )
            .await?;
            info!(
                project = %project.name,
                workspace_folder = %resolved.workspace_folder,
                remote_user = %resolved.remote_user,
                "devcontainer prebuilt"
            );
            if resolved.remote_user != project.user {
                reporter.warn(&format!(
                    "devcontainer remote user '{}' differs from project user '{}'",
                    resolved.remote_user, project.user
                ));
            }
        }
        BuildPath::Image => {
            create_from_image(runtime, project, project_dir, reporter).await?;
        }
    }

    reporter.success(&format!("project '{}' created", project.name));
    Ok(())
}

/// Start the primary container (polling until it reports running), bring up
/// compose siblings, and bootstrap the workspace agent.
pub async fn start_project(
    runtime: &impl ContainerRuntime,
    identity_source: &impl IdentitySource,
    project: &Project,
    bootstrap: &AgentBootstrap,
    poll: &PollConfig,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let name = project_container_name(runtime, project).await;

    let details = runtime
        .inspect_container(&name)
        .await
        .context("inspecting project container")?;

    if !details.running {
        reporter.step(&format!("starting container '{name}'..."));
        runtime
            .start_container(&name)
            .await
            .context("starting project container")?;
        wait_running(runtime, &name, poll).await?;
    }

    if let Some(compose_project) = compose::discover(runtime, &details).await? {
        reporter.step("starting compose containers...");
        compose::start_all(runtime, &compose_project, reporter).await?;
    }

    let desired = identity_source
        .current_identity()
        .await
        .context("resolving caller identity")?;
    identity::reconcile(runtime, &name, &project.user, desired, reporter).await?;

    reporter.step("starting workspace agent...");
    agent::launch_agent(
        runtime,
        &name,
        &project.user,
        &project.api_key,
        bootstrap,
        reporter,
    )
    .await?;

    reporter.success(&format!("project '{}' started", project.name));
    Ok(())
}

/// Stop the primary container and any compose siblings.
pub async fn stop_project(
    runtime: &impl ContainerRuntime,
    project: &Project,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let name = project_container_name(runtime, project).await;

    let details = match runtime.inspect_container(&name).await {
        Ok(details) => details,
        Err(err) if err.is_not_found() => {
            reporter.step(&format!("container '{name}' not found, nothing to stop"));
            return Ok(());
        }
        Err(err) => return Err(err).context("inspecting project container"),
    };

    reporter.step(&format!("stopping container '{name}'..."));
    tolerate_not_found(runtime.stop_container(&name).await)
        .context("stopping project container")?;

    if let Some(compose_project) = compose::discover(runtime, &details).await? {
        reporter.step("stopping compose containers...");
        compose::stop_all(runtime, &compose_project, reporter).await?;
    }

    reporter.success(&format!("project '{}' stopped", project.name));
    Ok(())
}

/// Remove the primary container, its volume, compose siblings, and their
/// default network. Idempotent: a second destroy is a no-op.
pub async fn destroy_project(
    runtime: &impl ContainerRuntime,
    project: &Project,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let name = project_container_name(runtime, project).await;
    let volume = project_volume_name(project);

    let details = match runtime.inspect_container(&name).await {
        Ok(details) => Some(details),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err).context("inspecting project container"),
    };

    reporter.step(&format!("removing container '{name}'..."));
    tolerate_not_found(runtime.remove_container(&name, true, true).await)
        .context("removing project container")?;

    tolerate_not_found(runtime.remove_volume(&volume, true).await)
        .context("removing project volume")?;

    if let Some(details) = details {
        if let Some(compose_project) = compose::discover(runtime, &details).await? {
            reporter.step("removing compose containers...");
            compose::remove_all(runtime, &compose_project, reporter).await?;
        }
    }

    reporter.success(&format!("project '{}' removed", project.name));
    Ok(())
}

// ── Info and naming ───────────────────────────────────────────────────────────

/// Inspect-based view of the project's primary container. A missing
/// container reports as not running.
pub async fn project_info(
    runtime: &impl ContainerRuntime,
    project: &Project,
) -> Result<ProjectInfo> {
    let name = project_container_name(runtime, project).await;
    match runtime.inspect_container(&name).await {
        Ok(details) => Ok(ProjectInfo {
            name: project.name.clone(),
            is_running: details.running,
            created: details.created,
        }),
        Err(err) if err.is_not_found() => Ok(ProjectInfo {
            name: project.name.clone(),
            is_running: false,
            created: None,
        }),
        Err(err) => Err(err).context("inspecting project container"),
    }
}

/// Aggregate [`project_info`] across every project of a workspace.
pub async fn workspace_info(
    runtime: &impl ContainerRuntime,
    workspace: &Workspace,
) -> Result<WorkspaceInfo> {
    let mut projects = Vec::with_capacity(workspace.projects.len());
    for project in &workspace.projects {
        projects.push(project_info(runtime, project).await?);
    }
    Ok(WorkspaceInfo {
        id: workspace.id.clone(),
        projects,
    })
}

/// The primary container's identity: preferred from a label lookup (the
/// build tool may have created the container under its own name), falling
/// back to the deterministic `{workspace_id}-{name}`.
pub async fn project_container_name(runtime: &impl ContainerRuntime, project: &Project) -> String {
    let fallback = container_name(&project.workspace_id, &project.name);

    let Ok(containers) = runtime
        .list_containers(&ContainerFilter::by_label(
            LABEL_WORKSPACE_ID,
            &project.workspace_id,
        ))
        .await
    else {
        return fallback;
    };

    containers
        .into_iter()
        .find(|c| {
            c.labels
                .get(LABEL_PROJECT_NAME)
                .is_some_and(|n| n == &project.name)
        })
        .map_or(fallback, |c| c.id)
}

/// The project's dedicated volume name.
#[must_use]
pub fn project_volume_name(project: &Project) -> String {
    volume_name(&project.workspace_id, &project.name)
}

// ── Pass-through operations ───────────────────────────────────────────────────

/// Execute a command inside a running container, mirroring output to the
/// sink and returning the captured result.
pub async fn exec_sync(
    runtime: &impl ContainerRuntime,
    container: &str,
    spec: &ExecSpec,
    reporter: &impl ProgressReporter,
) -> Result<ExecResult> {
    runtime
        .exec(container, spec, reporter)
        .await
        .context("executing command in container")
}

/// Stream a container's logs into the sink.
pub async fn container_logs(
    runtime: &impl ContainerRuntime,
    container: &str,
    follow: bool,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    runtime
        .container_logs(container, follow, reporter)
        .await
        .context("streaming container logs")
}

/// Pull an image unless the exact reference is already present locally.
pub async fn pull_image(
    runtime: &impl ContainerRuntime,
    image: &str,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    if runtime
        .image_exists(image)
        .await
        .context("checking for image")?
    {
        reporter.step(&format!("image '{image}' already present"));
        return Ok(());
    }
    reporter.step(&format!("pulling image '{image}'..."));
    runtime
        .pull_image(image, reporter)
        .await
        .context("pulling image")
}

/// Push an image, streaming progress into the sink.
pub async fn push_image(
    runtime: &impl ContainerRuntime,
    image: &str,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step(&format!("pushing image '{image}'..."));
    runtime
        .push_image(image, reporter)
        .await
        .context("pushing image")
}

// ── Internal steps ────────────────────────────────────────────────────────────

/// Clone the project repository through an ephemeral git helper. The parent
/// of the project directory is bind-mounted so the clone lands exactly at
/// `project_dir`; ownership is handed to the caller's identity before any
/// user-owned step touches the tree.
async fn clone_repository(
    runtime: &impl ContainerRuntime,
    identity_source: &impl IdentitySource,
    project: &Project,
    project_dir: &Path,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step(&format!("cloning {}...", project.repository.url));
    pull_image(runtime, CLONE_IMAGE, reporter).await?;

    let desired = identity_source
        .current_identity()
        .await
        .context("resolving caller identity")?;
    let owner = (!desired.is_root()).then_some((desired.uid, desired.gid));

    let target = format!(
        "/workdir/{}",
        container_name(&project.workspace_id, &project.name)
    );
    let parent = project_dir.parent().unwrap_or(project_dir);

    let spec = ContainerSpec {
        name: Some(uuid::Uuid::new_v4().to_string()),
        entrypoint: Some(vec!["sh".to_string()]),
        cmd: vec![
            "-c".to_string(),
            clone_script(&project.repository.url, &target, owner),
        ],
        binds: vec![BindMount::new(parent.to_string_lossy(), "/workdir")],
        ..ContainerSpec::new(CLONE_IMAGE)
    };

    task_runner::run_task(runtime, &spec, &task_runner::TaskOptions::default(), reporter)
        .await
        .context("cloning repository")
}

/// Image build path: pull the project image and create the container
/// directly, attached to the workspace network.
async fn create_from_image(
    runtime: &impl ContainerRuntime,
    project: &Project,
    project_dir: &Path,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let image = project
        .image
        .as_deref()
        .with_context(|| format!("project '{}' has no image to fall back to", project.name))?;

    pull_image(runtime, image, reporter).await?;

    reporter.step("creating project container...");
    let spec = ContainerSpec {
        name: Some(container_name(&project.workspace_id, &project.name)),
        hostname: Some(project.name.clone()),
        labels: [
            (LABEL_WORKSPACE_ID.to_string(), project.workspace_id.clone()),
            (LABEL_PROJECT_NAME.to_string(), project.name.clone()),
            (
                LABEL_REPOSITORY_URL.to_string(),
                project.repository.url.clone(),
            ),
        ]
        .into(),
        user: Some(project.user.clone()),
        env: project
            .env_vars
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect(),
        entrypoint: Some(vec!["sleep".to_string(), "infinity".to_string()]),
        privileged: true,
        network_mode: Some(network_name(&project.workspace_id)),
        extra_hosts: vec!["host.docker.internal:host-gateway".to_string()],
        binds: vec![BindMount::new(
            project_dir.to_string_lossy(),
            format!("/home/{}/{}", project.user, project.name),
        )],
        ..ContainerSpec::new(image)
    };

    match runtime.create_container(&spec).await {
        Ok(_) => Ok(()),
        // The deterministic name makes re-creation after a partial failure
        // idempotent: an existing container is the desired state.
        Err(err) if err.is_conflict() => {
            reporter.step("container already exists, skipping create");
            Ok(())
        }
        Err(err) => Err(err).context("creating project container"),
    }
}

/// Poll inspect until the container reports running, bounded by `poll`.
async fn wait_running(
    runtime: &impl ContainerRuntime,
    name: &str,
    poll: &PollConfig,
) -> Result<()> {
    let started = tokio::time::Instant::now();
    loop {
        let details = runtime
            .inspect_container(name)
            .await
            .context("polling project container state")?;
        if details.running {
            return Ok(());
        }
        if started.elapsed() >= poll.deadline {
            return Err(RuntimeError::Timeout {
                what: format!("container '{name}' to report running"),
                deadline: poll.deadline,
            }
            .into());
        }
        tokio::time::sleep(poll.interval).await;
    }
}

fn tolerate_not_found(result: Result<(), RuntimeError>) -> Result<(), RuntimeError> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}
