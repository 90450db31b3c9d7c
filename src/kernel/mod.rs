//! Thin wrappers around the kernel and libc facilities the launcher touches.
//!
//! All `unsafe` code is concentrated here with explicit SAFETY comments.
//! Dependency direction: account -> loginuid -> credentials

pub mod account;
pub mod credentials;
pub mod loginuid;
