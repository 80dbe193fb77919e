//! Application service — workspace agent bootstrap.
//!
//! The agent exposes no readiness signal, so its startup script races a
//! fixed grace period: whichever reports first wins. A script that fails
//! fast is surfaced; one that is merely slow is assumed healthy.

use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::application::ports::{ContainerRuntime, ExecSpec, ProgressReporter};
use crate::domain::scripts::agent_start_script;

/// How long a silent start script is given before it is presumed healthy.
pub const DEFAULT_AGENT_GRACE: Duration = Duration::from_secs(5);

/// Agent bootstrap parameters.
#[derive(Debug, Clone)]
pub struct AgentBootstrap {
    pub download_url: String,
    pub grace: Duration,
}

impl AgentBootstrap {
    #[must_use]
    pub fn new(download_url: impl Into<String>) -> Self {
        Self {
            download_url: download_url.into(),
            grace: DEFAULT_AGENT_GRACE,
        }
    }
}

/// Run the agent startup script as `user` inside the running container,
/// attaching its output to the sink.
pub async fn launch_agent(
    runtime: &impl ContainerRuntime,
    container: &str,
    user: &str,
    api_key: &str,
    bootstrap: &AgentBootstrap,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let spec = ExecSpec {
        cmd: vec![
            "bash".to_string(),
            "-c".to_string(),
            agent_start_script(&bootstrap.download_url, api_key),
        ],
        user: Some(user.to_string()),
    };

    let exec = runtime.exec(container, &spec, reporter);
    tokio::pin!(exec);

    tokio::select! {
        result = &mut exec => {
            let result = result.context("launching workspace agent")?;
            if !result.success() {
                bail!(
                    "agent start script exited with status {}: {}",
                    result.exit_code,
                    String::from_utf8_lossy(&result.stderr).trim()
                );
            }
            Ok(())
        }
        () = tokio::time::sleep(bootstrap.grace) => Ok(()),
    }
}
