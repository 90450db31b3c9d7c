/// Core types shared by every stage of the launch pipeline
use std::ffi::OsString;
use std::fmt;
use thiserror::Error;

/// Parsed command line: who to bind/assume and what to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Account whose uid becomes the audit login identity
    pub username: String,
    /// Assume the account's uid, gid and groups before exec
    pub set_privileges: bool,
    /// Program to exec, searched on PATH when it has no slash
    pub command: OsString,
    /// Arguments passed to the program after argv[0]
    pub args: Vec<OsString>,
}

impl InvocationRequest {
    /// Full argument vector for exec, argv[0] included.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Numeric identity looked up from the account database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl fmt::Display for ResolvedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid={} gid={}", self.uid, self.gid)
    }
}

/// Sub-step of the privilege drop, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropStep {
    /// Target ids rejected before touching the kernel
    Validate,
    /// getgrouplist for the target account
    GroupList,
    /// setgroups with the resolved list
    SetGroups,
    /// setresgid(gid, gid, gid)
    SetGid,
    /// setresuid(uid, uid, uid)
    SetUid,
    /// Read-back of the live credentials after the drop
    Verify,
}

impl DropStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::GroupList => "getgrouplist",
            Self::SetGroups => "setgroups",
            Self::SetGid => "setresgid",
            Self::SetUid => "setresuid",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for DropStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure the launcher can report. All of them are terminal.
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to get account entry for {username}: {reason}")]
    UnknownUser { username: String, reason: String },

    #[error("failed to set loginuid for user {username} (uid {uid}): {reason}")]
    AuditBind {
        username: String,
        uid: u32,
        reason: String,
    },

    #[error("{step} failed for {username}: {reason}")]
    PrivilegeDrop {
        step: DropStep,
        username: String,
        reason: String,
    },

    #[error("failed to execute {command}: {reason}")]
    Exec {
        command: String,
        reason: String,
        not_found: bool,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LauncherError {
    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::UnknownUser { .. }
            | Self::AuditBind { .. }
            | Self::PrivilegeDrop { .. }
            | Self::Io(_) => 1,
            Self::Exec { not_found: true, .. } => 127,
            Self::Exec { .. } => 126,
        }
    }

    /// The failed drop sub-step, if this is a privilege drop failure.
    pub fn drop_step(&self) -> Option<DropStep> {
        match self {
            Self::PrivilegeDrop { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub(crate) fn drop_failed(step: DropStep, username: &str, reason: impl fmt::Display) -> Self {
        Self::PrivilegeDrop {
            step,
            username: username.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
