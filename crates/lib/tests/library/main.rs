//! End-to-end tests for weld-lib.

mod assemble_load_tests;
mod common;
mod pipeline_tests;
