//! Application service — run one ephemeral helper container to completion.
//!
//! The same pattern serves every short-lived helper: repository clones,
//! socket-forward bootstraps, devcontainer config reads, and devcontainer
//! builds. The helper's logs are tailed into the caller's sink concurrently
//! with the exit wait; the log stream may not be attachable the instant the
//! container starts, so attachment retries on a fixed backoff.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::ports::{ContainerRuntime, ContainerSpec, ProgressReporter};
use crate::domain::error::TaskError;

/// How long a still-attaching log tail may run on after the helper exits.
const LOG_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Bounded retry policy for attaching to a helper's log stream.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Per-run knobs for one helper container.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOptions {
    /// Retain the helper after completion for debugging.
    pub keep_container: bool,
    pub retry: RetryConfig,
}

/// Create the helper, start it, tail its logs into `sink`, and block until
/// it exits. Exit code 0 is success; any other exit code or wait error is a
/// distinct failure carrying the code or message. The container is removed
/// afterwards unless [`TaskOptions::keep_container`] is set.
pub async fn run_task(
    runtime: &impl ContainerRuntime,
    spec: &ContainerSpec,
    opts: &TaskOptions,
    sink: &impl ProgressReporter,
) -> Result<()> {
    let id = runtime
        .create_container(spec)
        .await
        .context("creating helper container")?;

    let outcome = drive_to_exit(runtime, &id, opts, sink).await;

    if !opts.keep_container {
        if let Err(err) = runtime.remove_container(&id, true, true).await {
            if !err.is_not_found() {
                warn!(container = %id, error = %err, "failed to remove helper container");
            }
        }
    }

    outcome
}

async fn drive_to_exit(
    runtime: &impl ContainerRuntime,
    id: &str,
    opts: &TaskOptions,
    sink: &impl ProgressReporter,
) -> Result<()> {
    let wait = runtime.wait_container(id);
    tokio::pin!(wait);

    runtime
        .start_container(id)
        .await
        .context("starting helper container")?;

    let logs = tail_logs(runtime, id, opts.retry, sink);
    tokio::pin!(logs);
    let mut logs_done = false;

    // The wait future is pinned once and polled across iterations; the log
    // tail runs beside it and must not complete the select on its own.
    let status = loop {
        tokio::select! {
            status = &mut wait => break status,
            () = &mut logs, if !logs_done => logs_done = true,
        }
    };

    // A fast exit can beat the log attach; give the tail a moment to drain
    // before tearing the helper down.
    if !logs_done {
        let _ = tokio::time::timeout(LOG_DRAIN_GRACE, &mut logs).await;
    }

    match status {
        Ok(0) => Ok(()),
        Ok(code) => Err(TaskError::ExitCode(code).into()),
        Err(err) => Err(TaskError::Wait(err.to_string()).into()),
    }
}

/// Keep retrying the log attach until it succeeds, the attempts run out, or
/// the parent operation completes (dropping this future).
async fn tail_logs(
    runtime: &impl ContainerRuntime,
    id: &str,
    retry: RetryConfig,
    sink: &impl ProgressReporter,
) {
    let mut attempts = 0;
    loop {
        match runtime.container_logs(id, true, sink).await {
            Ok(()) => return,
            Err(err) => {
                attempts += 1;
                if attempts >= retry.max_attempts {
                    warn!(
                        container = %id,
                        attempts,
                        error = %err,
                        "giving up on helper container log stream"
                    );
                    return;
                }
                tokio::time::sleep(retry.backoff).await;
            }
        }
    }
}
