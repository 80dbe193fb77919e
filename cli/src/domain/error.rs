//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

// ── Container runtime errors ──────────────────────────────────────────────────

/// Errors surfaced by the container runtime port.
///
/// `NotFound` is the predicate every destructive step checks before treating
/// absence as success. `Conflict` resolves the socket-forward creation race:
/// the loser treats it as discovery of the existing container.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{operation} '{target}': not found")]
    NotFound {
        operation: &'static str,
        target: String,
    },

    #[error("{operation} '{target}': name conflict")]
    Conflict {
        operation: &'static str,
        target: String,
    },

    #[error("timed out after {}s waiting for {what}", deadline.as_secs())]
    Timeout { what: String, deadline: Duration },

    #[error("{operation} '{target}': {message}")]
    Api {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("container runtime connection failed: {0}")]
    Connect(String),
}

impl RuntimeError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// ── Helper container errors ───────────────────────────────────────────────────

/// Terminal outcomes of one ephemeral helper container run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("container exited with status {0}")]
    ExitCode(i64),

    #[error("container exited with error: {0}")]
    Wait(String),
}

// ── Devcontainer resolution errors ────────────────────────────────────────────

/// Errors raised while resolving a devcontainer configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("devcontainer configuration at '{path}' is not valid JSON: {message}")]
    Parse { path: String, message: String },

    #[error("unable to determine {0} from devcontainer configuration")]
    MissingProperty(&'static str),

    #[error("unable to find start of JSON in devcontainer configuration output")]
    NoJsonInOutput,
}
