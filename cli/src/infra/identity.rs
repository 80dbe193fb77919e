//! Local OS implementation of the `IdentitySource` port.

use anyhow::Result;

use crate::application::ports::{Identity, IdentitySource};

/// Resolves the caller's identity from the local process's user context.
pub struct LocalIdentity;

impl IdentitySource for LocalIdentity {
    async fn current_identity(&self) -> Result<Identity> {
        Ok(Identity {
            uid: nix::unistd::Uid::current().as_raw(),
            gid: nix::unistd::Gid::current().as_raw(),
        })
    }
}

/// Fixed identity, for flows that must run as a specific user regardless of
/// the invoking process (e.g. provisioning on behalf of root).
pub struct FixedIdentity(pub Identity);

impl IdentitySource for FixedIdentity {
    async fn current_identity(&self) -> Result<Identity> {
        Ok(self.0)
    }
}
