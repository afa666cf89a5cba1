//! Common types and utilities for the pyz type checker.
//!
//! This crate provides foundational types used across all pyz crates:
//! - Text ranges over byte offsets (`TextRange`)
//! - Position/Range types for line/column source locations (`LineMap`)
//! - Cooperative cancellation (`CancellationToken`)

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position, Range, TextRange};

// Cancellation signal shared between a request and its handler
pub mod cancellation;
pub use cancellation::CancellationToken;
