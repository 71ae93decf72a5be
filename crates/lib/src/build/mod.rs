//! The build pipeline.
//!
//! Each stage lives in its own module and can run on its own; the
//! [`orchestrator`] strings them together per profile.
//!
//! # Submodules
//!
//! - [`concat`] - bundle concatenation
//! - [`change`] - timestamp based change detection
//! - [`minify`] - minify and compress stage, built-in collaborators
//! - [`deps`] - dependency manifest mirroring and install
//! - [`package`] - staging and packaging
//! - [`orchestrator`] - per-profile stage sequencing

pub mod change;
pub mod concat;
pub mod deps;
pub mod minify;
pub mod orchestrator;
pub mod package;
mod types;

pub use orchestrator::{BuildContext, ProfileOutcome, ProfileReport, build_profile, build_profiles};
pub use types::*;
