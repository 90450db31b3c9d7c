//! Shared types and the launcher error.

pub mod types;
