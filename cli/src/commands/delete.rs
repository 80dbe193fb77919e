//! `berth delete` — remove a project, optionally its workspace network.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::commands;

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Path to the project descriptor (JSON)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Also remove the workspace network
    #[arg(long)]
    pub workspace: bool,
}

/// Run `berth delete`.
///
/// Destroy is idempotent: resources already gone are treated as removed.
///
/// # Errors
///
/// Returns an error if the runtime rejects a removal for any reason other
/// than absence.
pub async fn run(args: &DeleteArgs, app: &AppContext) -> Result<()> {
    let project = commands::load_project(&args.file)?;
    let reporter = app.terminal_reporter();

    lifecycle::destroy_project(&app.runtime, &project, &reporter).await?;

    if args.workspace {
        lifecycle::destroy_workspace(&app.runtime, &project.workspace_id, &reporter).await?;
    }
    Ok(())
}
