//! `berth logs` — stream a container's output.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Container name or id
    pub container: String,

    /// Print the current log contents without following
    #[arg(long)]
    pub no_follow: bool,
}

/// Run `berth logs`.
///
/// # Errors
///
/// Returns an error if the container is unknown or the stream breaks.
pub async fn run(args: &LogsArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    lifecycle::container_logs(&app.runtime, &args.container, !args.no_follow, &reporter).await
}
