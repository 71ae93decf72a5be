//! Shared utilities.
//!
//! Filesystem helpers used by the build stages and test helpers.

pub mod fs;
pub mod json;

#[cfg(test)]
pub mod testutil;
