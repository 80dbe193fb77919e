//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Remote development workspaces on your container runtime
#[derive(Parser)]
#[command(
    name = "berth",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a project: clone sources and build its container
    Create(commands::create::CreateArgs),

    /// Start a project's containers and launch the workspace agent
    Start(commands::start::StartArgs),

    /// Stop a project's containers (preserves state)
    Stop(commands::stop::StopArgs),

    /// Remove a project's containers, volume, and compose siblings
    Delete(commands::delete::DeleteArgs),

    /// Show project container status
    Info(commands::info::InfoArgs),

    /// Stream a container's logs
    Logs(commands::logs::LogsArgs),

    /// Execute a command inside a running container
    Exec(commands::exec::ExecArgs),

    /// Pull an image
    Pull(commands::image::PullArgs),

    /// Push an image
    Push(commands::image::PushArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            command,
        } = self;

        if let Command::Version = command {
            return commands::version::run();
        }

        let app = AppContext::new(&AppFlags { no_color, quiet })?;
        match command {
            Command::Create(args) => commands::create::run(&args, &app).await,
            Command::Start(args) => commands::start::run(&args, &app).await,
            Command::Stop(args) => commands::stop::run(&args, &app).await,
            Command::Delete(args) => commands::delete::run(&args, &app).await,
            Command::Info(args) => commands::info::run(&args, &app).await,
            Command::Logs(args) => commands::logs::run(&args, &app).await,
            Command::Exec(args) => commands::exec::run(&args, &app).await,
            Command::Pull(args) => commands::image::pull(&args, &app).await,
            Command::Push(args) => commands::image::push(&args, &app).await,
            Command::Version => unreachable!("handled above"),
        }
    }
}
