//! `berth start` — start a project and launch its workspace agent.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::agent::AgentBootstrap;
use crate::application::services::lifecycle::{self, PollConfig};
use crate::commands;
use crate::infra::identity::LocalIdentity;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Path to the project descriptor (JSON)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Download URL for the workspace agent
    #[arg(long, env = "BERTH_AGENT_URL", default_value = "https://get.berth.dev/agent")]
    pub agent_url: String,
}

/// Run `berth start`.
///
/// # Errors
///
/// Returns an error if the container cannot be started or the agent script
/// fails fast.
pub async fn run(args: &StartArgs, app: &AppContext) -> Result<()> {
    let project = commands::load_project(&args.file)?;
    let reporter = app.terminal_reporter();

    lifecycle::start_project(
        &app.runtime,
        &LocalIdentity,
        &project,
        &AgentBootstrap::new(&args.agent_url),
        &PollConfig::default(),
        &reporter,
    )
    .await
}
