//! `berth info` — show a project's container status.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::commands;

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the project descriptor (JSON)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run `berth info`.
///
/// # Errors
///
/// Returns an error if the runtime cannot be queried.
pub async fn run(args: &InfoArgs, app: &AppContext) -> Result<()> {
    let project = commands::load_project(&args.file)?;
    let info = lifecycle::project_info(&app.runtime, &project).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let ctx = &app.output;
    ctx.header(&format!("Project {}", info.name));
    ctx.kv("Running", if info.is_running { "yes" } else { "no" });
    if let Some(created) = &info.created {
        ctx.kv("Created", created);
    }
    ctx.kv(
        "Container",
        &lifecycle::project_container_name(&app.runtime, &project).await,
    );
    ctx.kv("Volume", &lifecycle::project_volume_name(&project));
    Ok(())
}
