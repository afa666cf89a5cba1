//! Type object model for the pyz type checker.
//!
//! - `types` - type objects (`Type`, `TypeKind`) and the detail records they share
//! - `store` - `TypeStore`, the arena that owns the whole (possibly cyclic) graph
//! - `evaluator` - the `TypeEvaluator` query trait implemented by the checker
//! - `recursion` - `RecursionGuard` for cycle-safe on-demand inference

pub mod evaluator;
pub mod recursion;
pub mod store;
pub mod types;

pub use evaluator::{ClassTypeResult, FunctionTypeResult, TypeEvaluator};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use store::TypeStore;
pub use types::{
    ClassDetail, ClassDetailId, ClassTypeFlags, FunctionDetail, FunctionDetailId,
    FunctionParameter, FunctionTypeFlags, LiteralValue, ParamSpecEntry, Type, TypeCategory,
    TypeFlags, TypeId, TypeKind, TypeVarDetail, TypeVarDetailId, Variance,
};
