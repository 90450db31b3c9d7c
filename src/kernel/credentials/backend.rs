//! Kernel seam for the credential transition.

use crate::kernel::account;
use nix::unistd::{Gid, Uid};
use std::ffi::CStr;
use std::fmt;

/// Live real/effective/saved ids and supplementary groups of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub uid: [Uid; 3],
    pub gid: [Gid; 3],
    pub groups: Vec<Gid>,
}

impl fmt::Display for CredentialSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = self.groups.iter().map(|g| g.to_string()).collect();
        write!(
            f,
            "UID: real={}, effective={}, saved={} | GID: real={}, effective={}, saved={} | groups=[{}]",
            self.uid[0],
            self.uid[1],
            self.uid[2],
            self.gid[0],
            self.gid[1],
            self.gid[2],
            groups.join(",")
        )
    }
}

/// Operations the privilege drop issues, one method per kernel request.
///
/// `transition_to_user` is the only caller and fixes the order.
pub trait CredentialBackend {
    fn group_list(&self, username: &CStr, gid: Gid) -> std::io::Result<Vec<Gid>>;
    fn set_groups(&self, groups: &[Gid]) -> nix::Result<()>;
    fn set_resgid(&self, gid: Gid) -> nix::Result<()>;
    fn set_resuid(&self, uid: Uid) -> nix::Result<()>;
    fn snapshot(&self) -> nix::Result<CredentialSnapshot>;
}

/// The running process's own credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct KernelCredentials;

impl CredentialBackend for KernelCredentials {
    fn group_list(&self, username: &CStr, gid: Gid) -> std::io::Result<Vec<Gid>> {
        account::group_list(username, gid)
    }

    fn set_groups(&self, groups: &[Gid]) -> nix::Result<()> {
        nix::unistd::setgroups(groups)
    }

    fn set_resgid(&self, gid: Gid) -> nix::Result<()> {
        nix::unistd::setresgid(gid, gid, gid)
    }

    fn set_resuid(&self, uid: Uid) -> nix::Result<()> {
        nix::unistd::setresuid(uid, uid, uid)
    }

    fn snapshot(&self) -> nix::Result<CredentialSnapshot> {
        let uid = nix::unistd::getresuid()?;
        let gid = nix::unistd::getresgid()?;
        Ok(CredentialSnapshot {
            uid: [uid.real, uid.effective, uid.saved],
            gid: [gid.real, gid.effective, gid.saved],
            groups: nix::unistd::getgroups()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_matches_getuid() {
        let snapshot = KernelCredentials.snapshot().unwrap();
        assert_eq!(snapshot.uid[0], nix::unistd::getuid());
        assert_eq!(snapshot.uid[1], nix::unistd::geteuid());
        assert_eq!(snapshot.gid[0], nix::unistd::getgid());
    }

    #[test]
    fn snapshot_display_lists_everything() {
        let snapshot = CredentialSnapshot {
            uid: [Uid::from_raw(1000); 3],
            gid: [Gid::from_raw(100); 3],
            groups: vec![Gid::from_raw(100), Gid::from_raw(27)],
        };
        assert_eq!(
            snapshot.to_string(),
            "UID: real=1000, effective=1000, saved=1000 | GID: real=100, effective=100, saved=100 | groups=[100,27]"
        );
    }
}
