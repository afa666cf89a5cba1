//! Tokenizer for the pyz type checker.
//!
//! The scanner turns indentation-sensitive source text into a flat,
//! index-addressable token stream plus the line-start table of the file.

pub mod token;
pub use token::{
    KeywordKind, NewLineKind, NumberValue, OperatorKind, StringFlags, Token, TokenData, TokenKind,
};

pub mod scanner_impl;
pub use scanner_impl::{Scanner, TokenizerOutput, tokenize};

#[cfg(test)]
#[path = "tests/scanner_impl_tests.rs"]
mod scanner_impl_tests;
