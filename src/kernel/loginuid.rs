//! Audit login identity (`/proc/self/loginuid`).
//!
//! The kernel treats the first write for a session as "who authenticated
//! here". Nothing in this module prevents a second write; callers bind once.

use crate::config::types::{LauncherError, Result};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

pub const LOGINUID_PATH: &str = "/proc/self/loginuid";

/// Handle on the login-identity attribute of the current process.
#[derive(Clone, Debug)]
pub struct LoginUid {
    path: PathBuf,
}

impl Default for LoginUid {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginUid {
    pub fn new() -> Self {
        Self::with_path(LOGINUID_PATH)
    }

    /// Bind against another file; used to exercise the write path off-proc.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `uid` as the login identity. `username` only labels errors.
    ///
    /// Opened read/write with O_NOFOLLOW and O_TRUNC; the decimal string must
    /// go out in a single write of exactly its length.
    pub fn bind(&self, username: &str, uid: u32) -> Result<()> {
        let failed = |reason: String| LauncherError::AuditBind {
            username: username.to_string(),
            uid,
            reason,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(&self.path)
            .map_err(|e| failed(format!("can't open file {}: {}", self.path.display(), e)))?;

        let text = uid.to_string();
        let written = file
            .write(text.as_bytes())
            .map_err(|e| failed(e.to_string()))?;
        if written != text.len() {
            return Err(failed(format!(
                "short write ({} of {} bytes)",
                written,
                text.len()
            )));
        }

        log::info!(
            "Bound loginuid {} for {} via {}",
            uid,
            username,
            self.path.display()
        );
        Ok(())
    }

    /// Current login identity as recorded in the file.
    pub fn current(&self) -> Result<u32> {
        let mut text = String::new();
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(&self.path)?
            .read_to_string(&mut text)?;

        text.trim().parse::<u32>().map_err(|e| {
            LauncherError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} holds {:?}: {}", self.path.display(), text.trim(), e),
            ))
        })
    }
}
