//! `berth create` — provision a project from its descriptor.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::commands;
use crate::infra::fs::LocalFileReader;
use crate::infra::identity::LocalIdentity;

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Path to the project descriptor (JSON)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Override the directory the sources are cloned into
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
}

/// Run `berth create`.
///
/// # Errors
///
/// Returns an error if cloning or the container build fails.
pub async fn run(args: &CreateArgs, app: &AppContext) -> Result<()> {
    let project = commands::load_project(&args.file)?;
    let project_dir = args
        .project_dir
        .clone()
        .unwrap_or_else(|| commands::project_dir(&project));

    if let Some(parent) = project_dir.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let reporter = app.terminal_reporter();
    lifecycle::create_project(
        &app.runtime,
        &LocalFileReader,
        &LocalIdentity,
        &project,
        &project_dir,
        &reporter,
    )
    .await
}
