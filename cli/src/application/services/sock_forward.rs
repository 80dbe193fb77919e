//! Application service — the socket-forward proxy singleton.
//!
//! Exactly one long-lived proxy container per host exposes the runtime's
//! control socket over TCP for build tooling running docker-in-docker style.
//! Existence is always re-derived from the runtime, never cached in process
//! state. An existing container is returned as-is, without re-verifying that
//! it is healthy or running.

use anyhow::{Context, Result, bail};

use crate::application::ports::{
    BindMount, ContainerFilter, ContainerRuntime, ContainerSpec, ProgressReporter,
};
use crate::domain::names::{SOCK_FORWARD_CONTAINER, SOCK_FORWARD_IMAGE, SOCK_FORWARD_PORT};

/// Path of the runtime control socket, on the host and inside the proxy.
const RUNTIME_SOCKET: &str = "/var/run/docker.sock";

/// Ensure the proxy exists and return its container id.
///
/// Two callers can race past the existence check; the runtime's name
/// uniqueness makes the loser's create fail with a conflict, which is
/// treated as discovery of the winner's container.
pub async fn ensure(
    runtime: &impl ContainerRuntime,
    reporter: &impl ProgressReporter,
) -> Result<String> {
    if let Some(id) = find_existing(runtime).await? {
        return Ok(id);
    }

    if !runtime
        .image_exists(SOCK_FORWARD_IMAGE)
        .await
        .context("checking for socket-forward image")?
    {
        reporter.step("pulling socket-forward image...");
        runtime
            .pull_image(SOCK_FORWARD_IMAGE, reporter)
            .await
            .context("pulling socket-forward image")?;
    }

    reporter.step("starting socket-forward proxy...");
    let spec = proxy_spec();
    let id = match runtime.create_container(&spec).await {
        Ok(id) => id,
        Err(err) if err.is_conflict() => {
            return find_existing(runtime)
                .await?
                .context("socket-forward proxy vanished after a naming conflict");
        }
        Err(err) => return Err(err).context("creating socket-forward proxy"),
    };

    runtime
        .start_container(&id)
        .await
        .context("starting socket-forward proxy")?;
    Ok(id)
}

async fn find_existing(runtime: &impl ContainerRuntime) -> Result<Option<String>> {
    let candidates = runtime
        .list_containers(&ContainerFilter::by_name(SOCK_FORWARD_CONTAINER))
        .await
        .context("listing socket-forward containers")?;

    // The runtime's name filter matches substrings; keep exact matches only.
    let matches: Vec<_> = candidates
        .iter()
        .filter(|c| c.names.iter().any(|n| n == SOCK_FORWARD_CONTAINER))
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(one.id.clone())),
        _ => bail!("multiple containers named {SOCK_FORWARD_CONTAINER} found"),
    }
}

fn proxy_spec() -> ContainerSpec {
    ContainerSpec {
        name: Some(SOCK_FORWARD_CONTAINER.to_string()),
        user: Some("root".to_string()),
        cmd: vec![
            format!("tcp-listen:{SOCK_FORWARD_PORT},fork,reuseaddr"),
            format!("unix-connect:{RUNTIME_SOCKET}"),
        ],
        privileged: true,
        binds: vec![BindMount::new(RUNTIME_SOCKET, RUNTIME_SOCKET)],
        ..ContainerSpec::new(SOCK_FORWARD_IMAGE)
    }
}
