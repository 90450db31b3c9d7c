//! lu: bind the audit login identity, optionally assume a user's
//! credentials, then replace the process with a command.
//!
//! Run by trusted (typically setuid-root) tooling that needs a command to run
//! "as" a user while the audit trail still names the session that asked.
//!
//! # Architecture
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::account`]: passwd lookup and full group membership
//! - [`kernel::loginuid`]: `/proc/self/loginuid` write and read-back
//! - [`kernel::credentials`]: ordered setgroups -> setresgid -> setresuid
//!
//! ## Execution Control ([`exec`])
//! - [`exec::preexec`]: type-state launch chain, only `ExecReady` can exec
//! - [`exec::executor`]: pipeline orchestration
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: request/identity types and [`LauncherError`]
//!
//! ## CLI ([`cli`])
//! Argument parsing, logging setup and exit-code mapping.
//!
//! # Guarantees
//!
//! 1. Nothing is written or dropped until the account resolves
//! 2. The login identity is bound before any credential change
//! 3. Groups, then gid, then uid; the first failure stops the sequence
//! 4. No command runs after any failure
//! 5. exec replaces this process; there is never a child

// Kernel Primitives
pub mod kernel;

// Execution Control
pub mod exec;

// Configuration
pub mod config;

// CLI entrypoint wiring for the lu binary.
pub mod cli;

pub use config::types::*;
pub use exec::preexec;
