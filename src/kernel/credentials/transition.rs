//! Ordered drop to the target account's credentials.
//!
//! CRITICAL: setresgid MUST be called BEFORE setresuid. Once the uid is
//! lowered the process can no longer change its gid.

use super::backend::{CredentialBackend, CredentialSnapshot};
use super::validation::{validate_ids, verify_snapshot};
use crate::config::types::{DropStep, LauncherError, ResolvedIdentity, Result};
use nix::unistd::{Gid, Uid};
use std::ffi::CString;

/// validate -> getgrouplist -> setgroups -> setresgid -> setresuid -> verify.
///
/// Stops at the first failure. An error here means the process may be in a
/// partially dropped state and must exit without running anything.
pub fn transition_to_user<B: CredentialBackend + ?Sized>(
    backend: &B,
    username: &str,
    identity: ResolvedIdentity,
) -> Result<CredentialSnapshot> {
    validate_ids(username, identity)?;

    let c_username = CString::new(username).map_err(|_| {
        LauncherError::drop_failed(DropStep::Validate, username, "username contains NUL byte")
    })?;
    let gid = Gid::from_raw(identity.gid);
    let uid = Uid::from_raw(identity.uid);

    let groups = backend
        .group_list(&c_username, gid)
        .map_err(|e| LauncherError::drop_failed(DropStep::GroupList, username, e))?;
    log::debug!("Group list for {}: {:?}", username, groups);

    backend
        .set_groups(&groups)
        .map_err(|e| LauncherError::drop_failed(DropStep::SetGroups, username, e.desc()))?;
    log::debug!("Set {} supplementary groups", groups.len());

    // CRITICAL: GID before UID
    backend.set_resgid(gid).map_err(|e| {
        LauncherError::drop_failed(
            DropStep::SetGid,
            username,
            format!("real, effective, and saved group for gid {}: {}", gid, e.desc()),
        )
    })?;
    log::debug!("Set GID to {}", gid);

    backend.set_resuid(uid).map_err(|e| {
        LauncherError::drop_failed(
            DropStep::SetUid,
            username,
            format!("real, effective, and saved user for uid {}: {}", uid, e.desc()),
        )
    })?;
    log::debug!("Set UID to {}", uid);

    let snapshot = backend
        .snapshot()
        .map_err(|e| LauncherError::drop_failed(DropStep::Verify, username, e.desc()))?;
    verify_snapshot(username, identity, &groups, &snapshot)?;

    log::info!("Transitioned to {} ({})", username, identity);
    Ok(snapshot)
}
