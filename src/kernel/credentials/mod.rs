//! UID/GID/group transitions to the target account.
//!
//! CRITICAL: setgroups, then setresgid, then setresuid. Nothing else.

mod backend;
mod transition;
mod validation;

pub use backend::{CredentialBackend, CredentialSnapshot, KernelCredentials};
pub use transition::transition_to_user;
pub use validation::{validate_ids, verify_snapshot};
