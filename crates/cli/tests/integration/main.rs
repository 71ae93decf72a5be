//! CLI integration tests.

mod assemble_tests;
mod build_tests;
mod common;
mod load_tests;
