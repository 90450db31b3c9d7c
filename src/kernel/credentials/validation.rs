//! Checks before and after the credential transition.

use super::backend::CredentialSnapshot;
use crate::config::types::{DropStep, LauncherError, ResolvedIdentity, Result};
use nix::unistd::{Gid, Uid};

/// `(uid_t)-1` / `(gid_t)-1`: "leave unchanged" to setres*id, "unset" to audit.
const UNCHANGED_ID: u32 = u32::MAX;

/// Reject ids the kernel would read as "leave unchanged".
pub fn validate_ids(username: &str, identity: ResolvedIdentity) -> Result<()> {
    if identity.uid == UNCHANGED_ID || identity.gid == UNCHANGED_ID {
        return Err(LauncherError::drop_failed(
            DropStep::Validate,
            username,
            format!(
                "account maps to the reserved id {} ({})",
                UNCHANGED_ID, identity
            ),
        ));
    }
    Ok(())
}

/// Confirm the live credentials are exactly the target's.
pub fn verify_snapshot(
    username: &str,
    identity: ResolvedIdentity,
    expected_groups: &[Gid],
    snapshot: &CredentialSnapshot,
) -> Result<()> {
    let uid = Uid::from_raw(identity.uid);
    let gid = Gid::from_raw(identity.gid);

    if snapshot.uid.iter().any(|u| *u != uid) {
        return Err(LauncherError::drop_failed(
            DropStep::Verify,
            username,
            format!("UID verification failed: expected {}, got {}", uid, snapshot),
        ));
    }

    if snapshot.gid.iter().any(|g| *g != gid) {
        return Err(LauncherError::drop_failed(
            DropStep::Verify,
            username,
            format!("GID verification failed: expected {}, got {}", gid, snapshot),
        ));
    }

    // The kernel keeps the list sorted; compare as sets.
    let mut expected: Vec<u32> = expected_groups.iter().map(|g| g.as_raw()).collect();
    let mut actual: Vec<u32> = snapshot.groups.iter().map(|g| g.as_raw()).collect();
    expected.sort_unstable();
    expected.dedup();
    actual.sort_unstable();
    actual.dedup();
    if expected != actual {
        return Err(LauncherError::drop_failed(
            DropStep::Verify,
            username,
            format!(
                "group verification failed: expected {:?}, got {:?}",
                expected, actual
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(uid: u32, gid: u32) -> ResolvedIdentity {
        ResolvedIdentity { uid, gid }
    }

    fn snapshot(uid: u32, gid: u32, groups: &[u32]) -> CredentialSnapshot {
        CredentialSnapshot {
            uid: [Uid::from_raw(uid); 3],
            gid: [Gid::from_raw(gid); 3],
            groups: groups.iter().copied().map(Gid::from_raw).collect(),
        }
    }

    #[test]
    fn rejects_unchanged_uid() {
        let err = validate_ids("ghost", identity(u32::MAX, 100)).unwrap_err();
        assert_eq!(err.drop_step(), Some(DropStep::Validate));
    }

    #[test]
    fn rejects_unchanged_gid() {
        assert!(validate_ids("ghost", identity(1000, u32::MAX)).is_err());
    }

    #[test]
    fn accepts_root_and_regular_accounts() {
        assert!(validate_ids("root", identity(0, 0)).is_ok());
        assert!(validate_ids("alice", identity(1000, 1000)).is_ok());
    }

    #[test]
    fn verify_accepts_reordered_groups() {
        let expected = [Gid::from_raw(100), Gid::from_raw(27), Gid::from_raw(4)];
        let live = snapshot(1000, 100, &[4, 27, 100]);
        assert!(verify_snapshot("alice", identity(1000, 100), &expected, &live).is_ok());
    }

    #[test]
    fn verify_catches_saved_uid_left_behind() {
        let mut live = snapshot(1000, 100, &[100]);
        live.uid[2] = Uid::from_raw(0);
        let err = verify_snapshot("alice", identity(1000, 100), &[Gid::from_raw(100)], &live)
            .unwrap_err();
        assert_eq!(err.drop_step(), Some(DropStep::Verify));
        assert!(err.to_string().contains("UID verification failed"));
    }

    #[test]
    fn verify_catches_extra_group() {
        let live = snapshot(1000, 100, &[0, 100]);
        let err = verify_snapshot("alice", identity(1000, 100), &[Gid::from_raw(100)], &live)
            .unwrap_err();
        assert!(err.to_string().contains("group verification failed"));
    }
}
