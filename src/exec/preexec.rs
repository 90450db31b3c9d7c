//! Type-state launch chain.
//!
//! The sequence is FIXED:
//! 1. resolve the target account
//! 2. bind the audit login identity
//! 3. drop to the account's credentials, or explicitly keep the current ones
//! 4. exec the command
//!
//! Each step consumes the prior state and returns exactly one next state on
//! success. Only `Launch<ExecReady>` exposes exec, and the only ways to reach
//! it go through the audit bind.
//!
//! Exec straight after resolving does not compile:
//!
//! ```compile_fail
//! use lu::exec::preexec::{Launch, Resolved};
//!
//! fn early_exec(launch: Launch<Resolved>) {
//!     let _ = launch.exec_command();
//! }
//! ```
//!
//! Neither does skipping the audit bind:
//!
//! ```compile_fail
//! use lu::exec::preexec::{Launch, Resolved};
//!
//! fn skip_bind(launch: Launch<Resolved>) {
//!     let _ = launch.keep_privileges();
//! }
//! ```
//!
//! Nor reusing a consumed state:
//!
//! ```compile_fail
//! use lu::exec::preexec::{Launch, AuditBound};
//!
//! fn reuse(launch: Launch<AuditBound>) {
//!     let _ready = launch.keep_privileges();
//!     let _again = launch.keep_privileges();
//! }
//! ```

use crate::config::types::{InvocationRequest, LauncherError, ResolvedIdentity, Result};
use crate::kernel::account;
use crate::kernel::credentials::{transition_to_user, CredentialBackend, CredentialSnapshot};
use crate::kernel::loginuid::LoginUid;
use nix::errno::Errno;
use std::convert::Infallible;
use std::ffi::CString;
use std::marker::PhantomData;
use std::os::unix::ffi::OsStrExt;

/// Type-state marker: account resolved, nothing written yet
pub struct Resolved;

/// Type-state marker: audit login identity written
pub struct AuditBound;

/// Type-state marker: credentials settled, ready for exec
pub struct ExecReady;

/// A launch in progress. `S` records how far the sequence has got.
pub struct Launch<S> {
    request: InvocationRequest,
    identity: ResolvedIdentity,
    credentials: Option<CredentialSnapshot>,
    _state: PhantomData<S>,
}

impl<S> Launch<S> {
    pub fn request(&self) -> &InvocationRequest {
        &self.request
    }

    pub fn identity(&self) -> ResolvedIdentity {
        self.identity
    }

    fn advance<T>(self) -> Launch<T> {
        Launch {
            request: self.request,
            identity: self.identity,
            credentials: self.credentials,
            _state: PhantomData,
        }
    }
}

impl Launch<Resolved> {
    /// Look up the requested account. This is the only entry into the chain.
    pub fn resolve(request: InvocationRequest) -> Result<Self> {
        let identity = account::resolve(&request.username)?;
        Ok(Self {
            request,
            identity,
            credentials: None,
            _state: PhantomData,
        })
    }

    /// Write the resolved uid as the login identity.
    pub fn bind_login_identity(self, loginuid: &LoginUid) -> Result<Launch<AuditBound>> {
        loginuid.bind(&self.request.username, self.identity.uid)?;
        Ok(self.advance())
    }
}

impl Launch<AuditBound> {
    /// Assume the target account's groups, gid and uid, in that order.
    pub fn drop_privileges<B: CredentialBackend + ?Sized>(
        self,
        backend: &B,
    ) -> Result<Launch<ExecReady>> {
        let snapshot = transition_to_user(backend, &self.request.username, self.identity)?;
        log::debug!("After transition: {}", snapshot);

        let mut ready: Launch<ExecReady> = self.advance();
        ready.credentials = Some(snapshot);
        Ok(ready)
    }

    /// Exec with the invoking process's credentials unchanged.
    pub fn keep_privileges(self) -> Launch<ExecReady> {
        log::debug!("Keeping current credentials for {}", self.request.username);
        self.advance()
    }
}

impl Launch<ExecReady> {
    /// Credentials observed after the drop; `None` when they were kept.
    pub fn credentials(&self) -> Option<&CredentialSnapshot> {
        self.credentials.as_ref()
    }

    /// Replace the process image with the requested command.
    ///
    /// Never returns on success. PATH is searched when the command has no
    /// slash; environment and open descriptors are inherited.
    pub fn exec_command(self) -> Result<Infallible> {
        let command = self.request.command.to_string_lossy().into_owned();
        let argv = self.request.argv();

        let mut cargv = Vec::with_capacity(argv.len());
        for arg in &argv {
            let c = CString::new(arg.as_bytes()).map_err(|_| LauncherError::Exec {
                command: command.clone(),
                reason: "argument contains NUL byte".to_string(),
                not_found: false,
            })?;
            cargv.push(c);
        }

        log::debug!("Executing via execvp: {:?}", argv);
        match nix::unistd::execvp(&cargv[0], &cargv) {
            Ok(never) => match never {},
            Err(errno) => Err(LauncherError::Exec {
                command,
                reason: errno.desc().to_string(),
                not_found: matches!(errno, Errno::ENOENT | Errno::ENOTDIR),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn request(username: &str, command: &str, args: &[&str]) -> InvocationRequest {
        InvocationRequest {
            username: username.to_string(),
            set_privileges: false,
            command: OsString::from(command),
            args: args.iter().map(OsString::from).collect(),
        }
    }

    #[test]
    fn resolve_fills_identity() {
        let launch = Launch::resolve(request("root", "true", &[])).unwrap();
        assert_eq!(launch.identity(), ResolvedIdentity { uid: 0, gid: 0 });
        assert_eq!(launch.request().command, OsString::from("true"));
    }

    #[test]
    fn resolve_rejects_unknown_user() {
        let result = Launch::resolve(request("lu-no-such-account-5f3a", "true", &[]));
        assert!(matches!(result, Err(LauncherError::UnknownUser { .. })));
    }

    #[test]
    fn bind_then_keep_preserves_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loginuid");
        std::fs::write(&path, "").unwrap();

        let launch = Launch::resolve(request("root", "echo", &["hi"])).unwrap();
        let bound = launch
            .bind_login_identity(&LoginUid::with_path(&path))
            .unwrap();
        let ready = bound.keep_privileges();

        assert_eq!(ready.identity().uid, 0);
        assert_eq!(ready.request().args, vec![OsString::from("hi")]);
        assert!(ready.credentials().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0");
    }

    #[test]
    fn failed_bind_stops_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let launch = Launch::resolve(request("root", "true", &[])).unwrap();
        let result = launch.bind_login_identity(&LoginUid::with_path(dir.path().join("absent")));
        match result {
            Err(LauncherError::AuditBind { username, uid, .. }) => {
                assert_eq!(username, "root");
                assert_eq!(uid, 0);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("bind should have failed"),
        }
    }

    #[test]
    fn exec_rejects_nul_before_execvp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loginuid");
        std::fs::write(&path, "").unwrap();

        let ready = Launch::resolve(request("root", "echo", &["a\0b"]))
            .unwrap()
            .bind_login_identity(&LoginUid::with_path(&path))
            .unwrap()
            .keep_privileges();

        match ready.exec_command() {
            Err(LauncherError::Exec { reason, .. }) => assert!(reason.contains("NUL")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
