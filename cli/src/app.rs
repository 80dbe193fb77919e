//! Application context — unified state passed to every command handler.
//!
//! Constructed once in `Cli::run()` and passed as `&AppContext` to all
//! command handlers. Adding a new cross-cutting concern requires only one
//! field change here — zero command signatures change.

use anyhow::{Context, Result};

use crate::infra::docker::DockerRuntime;
use crate::output::OutputContext;
use crate::output::reporter::TerminalReporter;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Container runtime adapter.
    pub runtime: DockerRuntime,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the container runtime is unreachable.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            runtime: DockerRuntime::connect().context("connecting to the container runtime")?,
        })
    }

    /// Progress reporter bound to this context's terminal output.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
