//! Account database lookups: passwd entry and full group membership.

use crate::config::types::{LauncherError, ResolvedIdentity, Result};
use nix::unistd::{Gid, User};
use std::ffi::CStr;

/// Look up `username` in the account database.
///
/// A lookup error and a missing entry both surface as `UnknownUser`, with the
/// underlying detail kept for the diagnostic.
pub fn resolve(username: &str) -> Result<ResolvedIdentity> {
    match User::from_name(username) {
        Ok(Some(user)) => {
            let identity = ResolvedIdentity {
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
            };
            log::debug!("Resolved {} to {}", username, identity);
            Ok(identity)
        }
        Ok(None) => Err(LauncherError::UnknownUser {
            username: username.to_string(),
            reason: "no such user".to_string(),
        }),
        Err(errno) => Err(LauncherError::UnknownUser {
            username: username.to_string(),
            reason: errno.desc().to_string(),
        }),
    }
}

/// Supplementary groups of `username`, with `gid` included.
///
/// getgrouplist is queried twice: once with an empty buffer to learn the
/// count, then with a buffer of exactly that size. Only the second call's
/// failure is an error; the first is expected to report -1.
pub fn group_list(username: &CStr, gid: Gid) -> std::io::Result<Vec<Gid>> {
    let mut count: libc::c_int = 0;

    // SAFETY: a zero count with a null buffer asks only for the size; libc
    // writes nothing through the pointer.
    unsafe {
        libc::getgrouplist(
            username.as_ptr(),
            gid.as_raw(),
            std::ptr::null_mut(),
            &mut count,
        );
    }

    let capacity = usize::try_from(count).unwrap_or(0).max(1);
    let mut groups: Vec<libc::gid_t> = vec![0; capacity];
    let mut filled = count.max(1);

    // SAFETY: `groups` holds `filled` writable entries.
    let rc = unsafe {
        libc::getgrouplist(
            username.as_ptr(),
            gid.as_raw(),
            groups.as_mut_ptr(),
            &mut filled,
        )
    };
    if rc == -1 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!(
                "group membership changed or could not be read (need {} entries)",
                filled
            ),
        ));
    }

    groups.truncate(usize::try_from(filled).unwrap_or(0));
    Ok(groups.into_iter().map(Gid::from_raw).collect())
}
