//! weld-lib: build-and-load engine for weld
//!
//! This crate provides:
//! - `build`: the incremental build pipeline (assemble, bundle, minify,
//!   compress, dependency install, packaging)
//! - `template`: assembly templates and fragment manifests
//! - `ado`: assembly definition objects written next to every artifact
//! - `loader`: the assembly load protocol and its load context
//! - `profile`: the `weld.json` project file

pub mod ado;
pub mod build;
pub mod consts;
pub mod exec;
pub mod loader;
pub mod profile;
pub mod template;
pub mod util;
