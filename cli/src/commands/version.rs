//! `berth version` — print the CLI version.

use anyhow::Result;

/// Run `berth version`.
///
/// # Errors
///
/// Infallible; returns `Result` for command-handler uniformity.
pub fn run() -> Result<()> {
    println!("berth {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
