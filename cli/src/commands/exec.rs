//! `berth exec` — run a command inside a running container.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ExecSpec;
use crate::application::services::lifecycle;

/// Arguments for the exec command.
#[derive(Args)]
pub struct ExecArgs {
    /// Container name or id
    pub container: String,

    /// User to run as (defaults to the container's configured user)
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Command and arguments
    #[arg(required = true, trailing_var_arg = true)]
    pub cmd: Vec<String>,
}

/// Run `berth exec`.
///
/// # Errors
///
/// Returns an error if the exec cannot be created; a non-zero command exit
/// is reflected in the process exit code instead.
pub async fn run(args: &ExecArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    let spec = ExecSpec {
        cmd: args.cmd.clone(),
        user: args.user.clone(),
    };

    let result = lifecycle::exec_sync(&app.runtime, &args.container, &spec, &reporter).await?;
    if !result.success() {
        std::process::exit(i32::try_from(result.exit_code).unwrap_or(1));
    }
    Ok(())
}
