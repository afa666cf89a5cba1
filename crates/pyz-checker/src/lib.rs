//! Binder and lazy type evaluator for the pyz type checker.
//!
//! - `binder` - scopes, symbols and declarations for one parsed module
//! - `builtins` - synthesized `builtins`, `typing` and `abc` modules
//! - `state` - `CheckerState`, the memoizing `TypeEvaluator`
//!
//! The evaluator is split by concern: `expr` (expressions), `call_checker`
//! (calls, members, return inference), `declarations` (`class` and `def`),
//! `annotations` (type annotations) and `scope_finder` (name resolution).

pub mod binder;
pub use binder::{BinderState, Declaration, DeclarationKind, Scope, ScopeId, ScopeKind, Symbol};

pub mod builtins;
pub use builtins::Builtins;

pub mod state;
pub use state::CheckerState;

mod annotations;
mod call_checker;
mod declarations;
mod expr;
mod scope_finder;

#[cfg(test)]
#[path = "tests/checker_state_tests.rs"]
mod checker_state_tests;
