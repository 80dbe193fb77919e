//! Generators for the shell scripts berth executes inside containers.
//!
//! Pure string builders, kept out of the services so the exact commands are
//! unit-testable without a runtime.

/// Exit code the remap script reserves for "desired UID already claimed by a
/// different account". The reconciler treats it as a warning, not a failure.
pub const UID_COLLISION_EXIT: i64 = 64;

/// Quote a string for safe embedding inside single quotes in `sh -c`.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// Script that remaps `user`'s UID/GID to the desired identity and re-owns
/// the home directory. Must run as root inside the target container.
///
/// No-ops when the identity already matches. Exits with
/// [`UID_COLLISION_EXIT`] when another account claims the desired UID — two
/// accounts cannot share a UID, so the remap is abandoned. A GID collision is
/// softer: the account keeps its existing group id.
#[must_use]
pub fn remap_user_script(user: &str, uid: u32, gid: u32) -> String {
    let user = shell_quote(user);
    format!(
        r#"set -e
cur_uid="$(id -u {user})"
cur_gid="$(id -g {user})"
home="$(getent passwd {user} | cut -d: -f6)"
if [ "$cur_uid" = "{uid}" ] && [ "$cur_gid" = "{gid}" ]; then
    exit 0
fi
claimed="$(getent passwd {uid} | cut -d: -f1 || true)"
if [ -n "$claimed" ] && [ "$claimed" != {user} ]; then
    echo "uid {uid} is already claimed by account '$claimed'" >&2
    exit {collision}
fi
if getent group {gid} >/dev/null 2>&1; then
    if [ "$cur_gid" = "{gid}" ]; then new_gid="{gid}"; else new_gid="$cur_gid"; fi
else
    groupmod -g {gid} "$(id -gn {user})"
    new_gid="{gid}"
fi
usermod -u {uid} {user}
chown -R "{uid}:$new_gid" "$home"
"#,
        user = user,
        uid = uid,
        gid = gid,
        collision = UID_COLLISION_EXIT,
    )
}

/// Clone command for the git helper container. The clone runs as root (the
/// bind-mounted parent directory is host-owned), then ownership of the fresh
/// tree is handed to the caller's identity so later user-owned steps can
/// write to it.
#[must_use]
pub fn clone_script(clone_url: &str, target_dir: &str, owner: Option<(u32, u32)>) -> String {
    let url = shell_quote(clone_url);
    let target = shell_quote(target_dir);
    match owner {
        Some((uid, gid)) => {
            format!("set -e\ngit clone {url} {target}\nchown -R {uid}:{gid} {target}\n")
        }
        None => format!("set -e\ngit clone {url} {target}\n"),
    }
}

/// Startup script for the workspace agent, run as the resolved remote user.
#[must_use]
pub fn agent_start_script(download_url: &str, api_key: &str) -> String {
    format!(
        "export BERTH_API_KEY={key}\ncurl -sfL {url} | sh\n",
        key = shell_quote(api_key),
        url = shell_quote(download_url),
    )
}
