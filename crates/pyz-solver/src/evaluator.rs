//! Query surface of a type evaluator.

use crate::store::TypeStore;
use crate::types::TypeId;
use pyz_parser::NodeIndex;

/// Result of evaluating a `class` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTypeResult {
    pub class_type: TypeId,
    /// Type after applying decorators; equal to `class_type` when none apply.
    pub decorated_type: TypeId,
}

/// Result of evaluating a `def` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionTypeResult {
    pub function_type: TypeId,
    pub decorated_type: TypeId,
}

/// Lazily evaluates the types of nodes in one parsed file.
///
/// Queries take `&mut self` because evaluation fills caches; asking for the
/// same node twice yields the same handle.
pub trait TypeEvaluator {
    /// The store the returned handles point into.
    fn types(&self) -> &TypeStore;

    /// Type of an expression node, or `None` for nodes that do not evaluate
    /// to a value.
    fn get_type(&mut self, node: NodeIndex) -> Option<TypeId>;

    fn get_type_of_class(&mut self, class_node: NodeIndex) -> Option<ClassTypeResult>;

    fn get_type_of_function(&mut self, function_node: NodeIndex) -> Option<FunctionTypeResult>;
}
