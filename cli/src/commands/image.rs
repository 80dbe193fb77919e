//! `berth pull` / `berth push` — move images to and from registries.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;

/// Arguments for the pull command.
#[derive(Args)]
pub struct PullArgs {
    /// Image reference
    pub image: String,
}

/// Arguments for the push command.
#[derive(Args)]
pub struct PushArgs {
    /// Image reference
    pub image: String,
}

/// Run `berth pull`.
///
/// # Errors
///
/// Returns an error if the registry or the runtime rejects the pull.
pub async fn pull(args: &PullArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    lifecycle::pull_image(&app.runtime, &args.image, &reporter).await
}

/// Run `berth push`.
///
/// # Errors
///
/// Returns an error if the registry or the runtime rejects the push.
pub async fn push(args: &PushArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    lifecycle::push_image(&app.runtime, &args.image, &reporter).await
}
