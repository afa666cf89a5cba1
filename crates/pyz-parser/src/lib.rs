//! Parser and syntax tree for the pyz type checker.
//!
//! This crate provides:
//! - `NodeArena` - append-only node storage with index-based parent links
//! - `NodeData` / `NodeKind` - the syntax tree node variants
//! - `ParserState` - recursive-descent parser producing `ParseResults`
//! - `ParseTreeWalker` - pre-order traversal over a subtree
//! - Node lookup helpers (`find_node_by_offset`, `is_expression_node`)

pub mod node;
pub use node::{
    ArgumentCategory, ErrorCategory, Node, NodeData, NodeIndex, NodeKind, ParameterCategory,
};

pub mod arena;
pub use arena::NodeArena;

pub mod parser;
pub use parser::{ParseDiagnostic, ParseResults, ParserState, parse_file};

pub mod walker;
pub use walker::ParseTreeWalker;

pub mod utils;
pub use utils::{find_node_by_offset, is_expression_kind, is_expression_node};

#[cfg(test)]
#[path = "tests/parser_state_tests.rs"]
mod parser_state_tests;
