//! Application service — UID/GID reconciliation.
//!
//! Remaps a container account's UID/GID to the caller's identity so files in
//! bind-mounted project directories stay writable on both sides. Runs with
//! root privilege inside the container, before any user-owned process.

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::application::ports::{ContainerRuntime, ExecSpec, Identity, ProgressReporter};
use crate::domain::scripts::{UID_COLLISION_EXIT, remap_user_script};

/// Remap `user` inside `container` to the desired identity.
///
/// Root callers need no remapping. A UID collision with a pre-existing
/// account abandons the remap with a warning — two accounts cannot share a
/// UID — and the overall flow continues. Any other failure is fatal.
pub async fn reconcile(
    runtime: &impl ContainerRuntime,
    container: &str,
    user: &str,
    desired: Identity,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    if desired.is_root() {
        return Ok(());
    }

    reporter.step(&format!(
        "aligning user '{user}' with uid {}:{}...",
        desired.uid, desired.gid
    ));

    let spec = ExecSpec {
        cmd: vec![
            "sh".to_string(),
            "-c".to_string(),
            remap_user_script(user, desired.uid, desired.gid),
        ],
        user: Some("root".to_string()),
    };

    let result = runtime
        .exec(container, &spec, reporter)
        .await
        .context("remapping container user")?;

    match result.exit_code {
        0 => Ok(()),
        code if code == UID_COLLISION_EXIT => {
            let detail = String::from_utf8_lossy(&result.stderr).trim().to_string();
            warn!(container, user, detail = %detail, "uid/gid remap skipped");
            reporter.warn(&format!("uid/gid remap skipped: {detail}"));
            Ok(())
        }
        code => bail!(
            "uid/gid remap for '{user}' failed with status {code}: {}",
            String::from_utf8_lossy(&result.stderr).trim()
        ),
    }
}
