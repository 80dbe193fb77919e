//! Remote-session implementations of the `FileReader` and `IdentitySource`
//! ports, backed by the system `ssh` client.
//!
//! Callers cannot tell these apart from the local adapters beyond the
//! failure mode: connection errors instead of filesystem errors.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::application::ports::{FileReader, Identity, IdentitySource};
use crate::domain::scripts::shell_quote;

/// Default timeout for remote commands.
pub const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(30);

/// A remote session target (`user@host`) reached through the `ssh` binary.
pub struct SshSession {
    target: String,
    timeout: Duration,
}

impl SshSession {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: DEFAULT_SSH_TIMEOUT,
        }
    }

    /// Run one remote command with a guaranteed kill on timeout.
    async fn run(&self, command: &str) -> Result<Output> {
        let mut child = tokio::process::Command::new("ssh")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(&self.target)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn ssh to {}", self.target))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Read stdout/stderr concurrently with wait() to avoid pipe deadlock
        // when the remote command writes more than the OS pipe buffer.
        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for ssh to {}", self.target))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(self.timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("ssh to {} timed out after {}s", self.target, self.timeout.as_secs())
            }
        }
    }
}

/// Reads project files over the remote session.
pub struct RemoteFileReader {
    session: SshSession,
}

impl RemoteFileReader {
    #[must_use]
    pub fn new(session: SshSession) -> Self {
        Self { session }
    }
}

impl FileReader for RemoteFileReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let command = format!("cat {}", shell_quote(&path.to_string_lossy()));
        let output = self.session.run(&command).await?;
        if !output.status.success() {
            anyhow::bail!(
                "remote read of {} failed: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

/// Resolves the caller's identity on the remote side of the session.
pub struct RemoteIdentity {
    session: SshSession,
}

impl RemoteIdentity {
    #[must_use]
    pub fn new(session: SshSession) -> Self {
        Self { session }
    }
}

impl IdentitySource for RemoteIdentity {
    async fn current_identity(&self) -> Result<Identity> {
        let output = self.session.run("id -u && id -g").await?;
        if !output.status.success() {
            anyhow::bail!(
                "remote identity lookup failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut lines = text.lines();
        let uid = parse_id(lines.next(), "uid")?;
        let gid = parse_id(lines.next(), "gid")?;
        Ok(Identity { uid, gid })
    }
}

fn parse_id(line: Option<&str>, what: &str) -> Result<u32> {
    line.map(str::trim)
        .filter(|l| !l.is_empty())
        .with_context(|| format!("remote identity lookup returned no {what}"))?
        .parse()
        .with_context(|| format!("remote identity lookup returned a malformed {what}"))
}
