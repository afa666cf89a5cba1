//! Command-line front end for pyz debug tooling.
//!
//! This crate provides:
//! - `args` - clap definitions for the `pyz-debug` binary
//! - `driver` - turns parsed arguments into a debug info request and prints it
//! - `tracing_config` - opt-in `tracing` subscriber setup

pub mod args;
pub mod driver;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
