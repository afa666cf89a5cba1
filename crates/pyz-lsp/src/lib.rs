//! Editor-facing services for the pyz type checker.
//!
//! This crate provides:
//! - `Project` / `ProjectFile` - parsed and bound files looked up by name
//! - `debug_info` - token, parse tree and inferred-type dumps used to
//!   diagnose the checker's internal model

pub mod project;
pub use project::{Project, ProjectFile};

pub mod debug_info;
pub use debug_info::{CommandArg, DebugInfoKind, DumpFileDebugInfo, TreeDumper, TypePrinter};

#[cfg(test)]
#[path = "tests/tree_dumper_tests.rs"]
mod tree_dumper_tests;

#[cfg(test)]
#[path = "tests/type_printer_tests.rs"]
mod type_printer_tests;
