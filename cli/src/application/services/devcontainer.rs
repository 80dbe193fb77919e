//! Application service — devcontainer configuration resolution and build.
//!
//! Produces a final override configuration and runs the devcontainer tool
//! inside an ephemeral helper container wired to the socket-forward proxy.
//! The source tree is never mutated: every rewrite happens on an in-memory
//! copy materialized only inside the build container.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use berth_common::Project;

use crate::application::ports::{
    BindMount, ContainerRuntime, ContainerSpec, FileReader, ProgressReporter,
};
use crate::application::services::{sock_forward, task_runner};
use crate::domain::devconfig::{
    self, COMPOSE_OVERRIDE_PATH, DevcontainerConfig, OVERRIDE_CONFIG_PATH,
};
use crate::domain::error::ResolveError;
use crate::domain::names::{
    HELPER_IMAGE, LABEL_PROJECT_NAME, LABEL_WORKSPACE_ID, SOCK_FORWARD_PORT, mount_target,
};

/// One devcontainer build request.
#[derive(Debug, Clone, Copy)]
pub struct DevcontainerOptions<'a> {
    pub project: &'a Project,
    pub project_dir: &'a Path,
    /// Configuration path relative to the project directory.
    pub config_path: &'a str,
    /// Pass `--prebuild` — build without immediately starting.
    pub prebuild: bool,
}

/// Properties discovered while resolving the configuration.
#[derive(Debug, Clone)]
pub struct ResolvedBuild {
    pub workspace_folder: String,
    pub remote_user: String,
}

/// Resolve the configuration and run the devcontainer build.
pub async fn build(
    runtime: &impl ContainerRuntime,
    files: &impl FileReader,
    opts: &DevcontainerOptions<'_>,
    reporter: &impl ProgressReporter,
) -> Result<ResolvedBuild> {
    let sock_id = sock_forward::ensure(runtime, reporter).await?;

    let project_dir = opts.project_dir.to_string_lossy().into_owned();
    let target = mount_target(opts.project_dir);
    let target_config = format!("{target}/{}", opts.config_path);

    reporter.step("reading devcontainer configuration...");
    let output = read_configuration(runtime, &sock_id, &target, &target_config, opts, reporter)
        .await
        .context("reading devcontainer configuration")?;

    // The tool may compute these from base-image metadata, so they are taken
    // from its output rather than from the document.
    let tool_json = devconfig::scrape_json(&output)?;
    let tool_workspace_folder = devconfig::extract_property(tool_json, "workspaceFolder")
        .ok_or(ResolveError::MissingProperty("workspace folder"))?;
    let remote_user = devconfig::extract_property(tool_json, "remoteUser")
        .ok_or(ResolveError::MissingProperty("remote user"))?;

    let config_file = opts.project_dir.join(opts.config_path);
    let raw = files
        .read(&config_file)
        .await
        .with_context(|| format!("reading {}", config_file.display()))?;
    let mut config = DevcontainerConfig::parse(
        &String::from_utf8_lossy(&raw),
        &config_file.to_string_lossy(),
    )?;
    let doc_env = config.container_env();

    let workspace_folder = if config.workspace_folder().is_some() {
        tool_workspace_folder
    } else {
        let synthesized = format!("/workspaces/{}", opts.project.name);
        config.set_workspace_folder(&synthesized);
        synthesized
    };

    config.set_workspace_mount(&project_dir, &workspace_folder);

    let compose_prefix =
        rewrite_compose_file(files, &mut config, opts, &project_dir, &target).await?;

    let merged = devconfig::merge_env(&doc_env, &opts.project.env_vars, &workspace_folder);
    config.set_container_env(&merged);

    let config_json = config
        .to_pretty_json()
        .context("serializing override configuration")?;

    let mut up_cmd = vec![
        "devcontainer".to_string(),
        "up".to_string(),
        format!("--workspace-folder={target}"),
        format!("--config={target_config}"),
        format!("--override-config={OVERRIDE_CONFIG_PATH}"),
        format!("--id-label={LABEL_WORKSPACE_ID}={}", opts.project.workspace_id),
        format!("--id-label={LABEL_PROJECT_NAME}={}", opts.project.name),
    ];
    if opts.prebuild {
        up_cmd.push("--prebuild".to_string());
    }

    let script = format!(
        "echo '{}' > {OVERRIDE_CONFIG_PATH} && {compose_prefix}{}",
        config_json.replace('\'', r#"'"'"'"#),
        up_cmd.join(" "),
    );

    reporter.step("building devcontainer...");
    task_runner::run_task(
        runtime,
        &helper_spec(&sock_id, &project_dir, &target, vec!["-c".to_string(), script]),
        &task_runner::TaskOptions::default(),
        reporter,
    )
    .await
    .context("running devcontainer build")?;

    Ok(ResolvedBuild {
        workspace_folder,
        remote_user,
    })
}

/// Run the tool's read-only `read-configuration` mode and capture its output.
async fn read_configuration(
    runtime: &impl ContainerRuntime,
    sock_id: &str,
    target: &str,
    target_config: &str,
    opts: &DevcontainerOptions<'_>,
    reporter: &impl ProgressReporter,
) -> Result<String> {
    let capture = CaptureReporter::new(reporter);
    let script =
        format!("devcontainer read-configuration --workspace-folder={target} --config={target_config}");

    let project_dir = opts.project_dir.to_string_lossy();
    task_runner::run_task(
        runtime,
        &helper_spec(sock_id, &project_dir, target, vec!["-c".to_string(), script]),
        &task_runner::TaskOptions::default(),
        &capture,
    )
    .await?;

    Ok(capture.into_captured())
}

/// Rewrite an external compose file for the build container and return the
/// shell prefix that materializes it there.
async fn rewrite_compose_file(
    files: &impl FileReader,
    config: &mut DevcontainerConfig,
    opts: &DevcontainerOptions<'_>,
    project_dir: &str,
    target: &str,
) -> Result<String> {
    let Some(compose_rel) = config.docker_compose_file().map(str::to_owned) else {
        return Ok(String::new());
    };

    let config_dir = Path::new(opts.config_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty());

    let compose_path = match config_dir {
        Some(dir) => opts.project_dir.join(dir).join(&compose_rel),
        None => opts.project_dir.join(&compose_rel),
    };
    let content = files
        .read(&compose_path)
        .await
        .with_context(|| format!("reading {}", compose_path.display()))?;

    let mounted_config_dir = match config_dir {
        Some(dir) => format!("{target}/{}", dir.to_string_lossy()),
        None => target.to_string(),
    };
    let rewritten = devconfig::rewrite_compose(
        &String::from_utf8_lossy(&content),
        project_dir,
        &mounted_config_dir,
    );

    config.set_docker_compose_file(COMPOSE_OVERRIDE_PATH);
    Ok(format!("echo '{rewritten}' > {COMPOSE_OVERRIDE_PATH} && "))
}

/// Helper container template shared by the read and build invocations: the
/// devcontainer CLI image, joined to the proxy's network namespace, with the
/// project directory bind-mounted.
fn helper_spec(sock_id: &str, project_dir: &str, target: &str, cmd: Vec<String>) -> ContainerSpec {
    ContainerSpec {
        name: Some(uuid::Uuid::new_v4().to_string()),
        entrypoint: Some(vec!["sh".to_string()]),
        env: vec![format!("DOCKER_HOST=tcp://localhost:{SOCK_FORWARD_PORT}")],
        cmd,
        tty: true,
        privileged: true,
        network_mode: Some(format!("container:{sock_id}")),
        binds: vec![BindMount::new(project_dir, target)],
        ..ContainerSpec::new(HELPER_IMAGE)
    }
}

/// Forwards progress to the inner reporter while accumulating raw log lines
/// for scraping.
struct CaptureReporter<'a, R: ProgressReporter> {
    inner: &'a R,
    captured: Mutex<String>,
}

impl<'a, R: ProgressReporter> CaptureReporter<'a, R> {
    fn new(inner: &'a R) -> Self {
        Self {
            inner,
            captured: Mutex::new(String::new()),
        }
    }

    fn into_captured(self) -> String {
        self.captured.into_inner().unwrap_or_default()
    }
}

impl<R: ProgressReporter> ProgressReporter for CaptureReporter<'_, R> {
    fn step(&self, message: &str) {
        self.inner.step(message);
    }

    fn success(&self, message: &str) {
        self.inner.success(message);
    }

    fn warn(&self, message: &str) {
        self.inner.warn(message);
    }

    fn log(&self, line: &str) {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push_str(line);
        }
        self.inner.log(line);
    }
}
