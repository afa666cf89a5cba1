//! Checker state and the `TypeEvaluator` entry points.
//!
//! `CheckerState` borrows a parsed module and its bindings and evaluates
//! types lazily: nothing is computed until a node is queried, and every
//! result is memoized so repeated queries return the same handle. Expression
//! rules live in `expr`, calls in `call_checker`, class and function
//! statements in `declarations`, type annotations in `annotations` and name
//! resolution in `scope_finder`.

use crate::binder::BinderState;
use crate::builtins::Builtins;
use pyz_parser::{NodeArena, NodeIndex};
use pyz_solver::{
    ClassTypeResult, FunctionDetailId, FunctionTypeResult, RecursionGuard, RecursionProfile,
    RecursionResult, TypeEvaluator, TypeId, TypeStore, TypeVarDetailId,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub struct CheckerState<'a> {
    pub(crate) arena: &'a NodeArena,
    pub(crate) binder: &'a BinderState,
    pub(crate) module_name: String,
    pub(crate) types: TypeStore,
    pub(crate) builtins: Builtins,

    pub(crate) node_types: FxHashMap<NodeIndex, TypeId>,
    pub(crate) declaration_types: FxHashMap<NodeIndex, TypeId>,
    pub(crate) class_results: FxHashMap<NodeIndex, ClassTypeResult>,
    pub(crate) function_results: FxHashMap<NodeIndex, FunctionTypeResult>,
    pub(crate) inferred_returns: FxHashMap<FunctionDetailId, TypeId>,
    /// TypeVars specialized to the scope that uses them, keyed by
    /// (declaration, scope id).
    pub(crate) scoped_type_vars: FxHashMap<(TypeVarDetailId, String), TypeId>,
    /// `property` objects created by `@property`, mapped to their getter.
    pub(crate) property_getters: FxHashMap<TypeId, FunctionDetailId>,

    pub(crate) node_guard: RecursionGuard<NodeIndex>,
    pub(crate) declaration_guard: RecursionGuard<NodeIndex>,
    pub(crate) return_guard: RecursionGuard<FunctionDetailId>,
}

impl<'a> CheckerState<'a> {
    pub fn new(arena: &'a NodeArena, binder: &'a BinderState, module_name: &str) -> Self {
        let mut types = TypeStore::new();
        let builtins = Builtins::new(&mut types);
        debug!(module = module_name, nodes = arena.len(), "created checker");
        CheckerState {
            arena,
            binder,
            module_name: module_name.to_string(),
            types,
            builtins,
            node_types: FxHashMap::default(),
            declaration_types: FxHashMap::default(),
            class_results: FxHashMap::default(),
            function_results: FxHashMap::default(),
            inferred_returns: FxHashMap::default(),
            scoped_type_vars: FxHashMap::default(),
            property_getters: FxHashMap::default(),
            node_guard: RecursionGuard::with_profile(RecursionProfile::TypeEvaluation),
            declaration_guard: RecursionGuard::with_profile(RecursionProfile::TypeEvaluation),
            return_guard: RecursionGuard::with_profile(RecursionProfile::TypeEvaluation),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Memoized type of any node that evaluates to a value.
    pub fn get_type_of_node(&mut self, node: NodeIndex) -> Option<TypeId> {
        if let Some(&cached) = self.node_types.get(&node) {
            return Some(cached);
        }
        match self.node_guard.enter(node) {
            RecursionResult::Entered => {}
            denied => {
                trace!(node = %node, ?denied, "type evaluation re-entered");
                return Some(self.types.incomplete_unknown());
            }
        }
        let result = self.compute_type_of_node(node);
        self.node_guard.leave(node);
        if let Some(ty) = result {
            self.node_types.insert(node, ty);
        }
        result
    }

    /// Type of a node that must produce a value; `Unknown` when it does not.
    pub(crate) fn type_of_expression(&mut self, node: NodeIndex) -> TypeId {
        self.get_type_of_node(node)
            .unwrap_or_else(|| self.types.unknown())
    }

    pub(crate) fn unknown(&self) -> TypeId {
        self.types.unknown()
    }
}

impl TypeEvaluator for CheckerState<'_> {
    fn types(&self) -> &TypeStore {
        &self.types
    }

    fn get_type(&mut self, node: NodeIndex) -> Option<TypeId> {
        self.get_type_of_node(node)
    }

    fn get_type_of_class(&mut self, class_node: NodeIndex) -> Option<ClassTypeResult> {
        self.get_type_of_class_node(class_node)
    }

    fn get_type_of_function(&mut self, function_node: NodeIndex) -> Option<FunctionTypeResult> {
        self.get_type_of_function_node(function_node)
    }
}
