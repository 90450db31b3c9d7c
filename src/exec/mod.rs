//! Execution control
//!
//! Orders the account lookup, audit bind, credential drop and exec with
//! type-state enforcement.

pub mod executor;
pub mod preexec;
