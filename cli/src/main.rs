//! Berth CLI - Remote development workspaces on your container runtime

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
#[allow(dead_code)] // the full lifecycle API lives in the library; the binary uses a subset
mod application;
mod cli;
mod commands;
#[allow(dead_code)]
mod domain;
#[allow(dead_code)] // remote-session adapters are exercised through the library and tests
mod infra;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
