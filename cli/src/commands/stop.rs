//! `berth stop` — stop a project's containers.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::commands;

/// Arguments for the stop command.
#[derive(Args)]
pub struct StopArgs {
    /// Path to the project descriptor (JSON)
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

/// Run `berth stop`.
///
/// # Errors
///
/// Returns an error if a container refuses to stop.
pub async fn run(args: &StopArgs, app: &AppContext) -> Result<()> {
    let project = commands::load_project(&args.file)?;
    let reporter = app.terminal_reporter();
    lifecycle::stop_project(&app.runtime, &project, &reporter).await
}
