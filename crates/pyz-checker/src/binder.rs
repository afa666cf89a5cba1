//! Scope and symbol binding.
//!
//! The binder walks a parsed module once and records, for every scope
//! (module, class, function, lambda, comprehension), the names declared in it
//! and the nodes each declaration came from. Types are not computed here; the
//! evaluator reads these declarations on demand.

use indexmap::IndexMap;
use pyz_parser::{NodeArena, NodeData, NodeIndex, NodeKind, ParseTreeWalker};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Lambda,
    Comprehension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Variable,
    Parameter,
    Function,
    Class,
    Alias,
}

/// Position of a target inside a (possibly nested) unpacking assignment.
pub type UnpackPath = SmallVec<[u32; 2]>;

/// One place a symbol receives a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    /// The declaring node: a target `Name` (or `MemberAccess` for instance
    /// variables), a `Parameter`, a `Class`/`Function`, or an import node.
    pub node: NodeIndex,
    /// Expression or statement the value is inferred from.
    pub source: Option<NodeIndex>,
    pub annotation: Option<NodeIndex>,
    /// Element path when the target sits inside a tuple or list target.
    pub unpack_path: UnpackPath,
}

impl Declaration {
    fn new(kind: DeclarationKind, node: NodeIndex) -> Self {
        Declaration {
            kind,
            node,
            source: None,
            annotation: None,
            unpack_path: UnpackPath::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Symbol {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The node that opened the scope.
    pub node: NodeIndex,
    pub parent: Option<ScopeId>,
    pub symbols: IndexMap<String, Symbol>,
    pub global_names: FxHashSet<String>,
    pub nonlocal_names: FxHashSet<String>,
}

impl Scope {
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Binding results for one module.
#[derive(Debug, Clone, Default)]
pub struct BinderState {
    pub scopes: Vec<Scope>,
    /// Scope opened by a `Module`, `Class`, `Function`, `Lambda` or
    /// `ListComprehension` node.
    pub node_scopes: FxHashMap<NodeIndex, ScopeId>,
    /// Declaration introduced by a declaring node.
    pub node_declarations: FxHashMap<NodeIndex, Declaration>,
    /// `return` statements of each function, in source order.
    pub function_returns: FxHashMap<NodeIndex, Vec<NodeIndex>>,
    /// `yield` / `yield from` expressions of each function.
    pub function_yields: FxHashMap<NodeIndex, Vec<NodeIndex>>,
    /// `self.name = ...` assignments made inside a class's methods.
    pub instance_variables: FxHashMap<NodeIndex, IndexMap<String, Vec<Declaration>>>,
}

impl BinderState {
    pub fn new() -> Self {
        BinderState::default()
    }

    pub fn reset(&mut self) {
        *self = BinderState::default();
    }

    /// Bind every scope of the module rooted at `root`.
    pub fn bind_module(&mut self, arena: &NodeArena, root: NodeIndex) {
        self.reset();
        let module_scope = self.add_scope(ScopeKind::Module, root, None);
        let mut binder = Binder {
            state: self,
            scope: module_scope,
            functions: Vec::new(),
        };
        binder.walk_children(arena, root);
        debug!(
            scopes = self.scopes.len(),
            declarations = self.node_declarations.len(),
            "bound module"
        );
    }

    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scope_of_node(&self, node: NodeIndex) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    pub fn declaration(&self, node: NodeIndex) -> Option<&Declaration> {
        self.node_declarations.get(&node)
    }

    pub fn returns_of(&self, function: NodeIndex) -> &[NodeIndex] {
        self.function_returns
            .get(&function)
            .map_or(&[], Vec::as_slice)
    }

    pub fn yields_of(&self, function: NodeIndex) -> &[NodeIndex] {
        self.function_yields
            .get(&function)
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_generator(&self, function: NodeIndex) -> bool {
        !self.yields_of(function).is_empty()
    }

    /// Scope a node's names are evaluated in.
    ///
    /// Parts of a definition that run before the body exists (decorators,
    /// defaults, annotations, base classes, the first comprehension iterable)
    /// belong to the enclosing scope.
    pub fn scope_containing(&self, arena: &NodeArena, node: NodeIndex) -> ScopeId {
        let mut prev = node;
        let mut current = arena.parent(node);
        let mut in_first_iterable = false;

        while let Some(idx) = current {
            let Some(parent) = arena.get(idx) else {
                break;
            };
            let owns = match &parent.data {
                NodeData::Function {
                    suite, parameters, ..
                } => *suite == prev || is_parameter_name(arena, parameters, prev, node),
                NodeData::Lambda {
                    parameters,
                    expression,
                } => *expression == prev || is_parameter_name(arena, parameters, prev, node),
                NodeData::Class { suite, .. } => *suite == prev,
                NodeData::ListComprehensionFor { iterable, .. } => {
                    if *iterable == prev
                        && let Some(comprehension) = parent.parent
                        && let Some(NodeData::ListComprehension { comprehensions, .. }) =
                            arena.get(comprehension).map(|n| &n.data)
                        && comprehensions.first() == Some(&idx)
                    {
                        in_first_iterable = true;
                    }
                    false
                }
                NodeData::ListComprehension { .. } => !std::mem::take(&mut in_first_iterable),
                NodeData::Module { .. } => true,
                _ => false,
            };
            if owns && let Some(scope) = self.scope_of_node(idx) {
                return scope;
            }
            prev = idx;
            current = parent.parent;
        }
        self.module_scope()
    }

    /// Resolve `name` starting at `scope`, following the usual rules: the
    /// current scope, then enclosing function scopes (class scopes are only
    /// visible from directly inside them), then the module.
    pub fn lookup_name(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &Symbol)> {
        let start = self.scope(scope)?;
        if start.global_names.contains(name) {
            let module = self.module_scope();
            return self.scope(module)?.lookup(name).map(|s| (module, s));
        }

        let mut current = Some(scope);
        while let Some(id) = current {
            let entry = self.scope(id)?;
            let visible = id == scope || entry.kind != ScopeKind::Class;
            if visible && let Some(symbol) = entry.lookup(name) {
                return Some((id, symbol));
            }
            current = entry.parent;
        }
        None
    }

    fn add_scope(&mut self, kind: ScopeKind, node: NodeIndex, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            node,
            parent,
            symbols: IndexMap::new(),
            global_names: FxHashSet::default(),
            nonlocal_names: FxHashSet::default(),
        });
        self.node_scopes.insert(node, id);
        id
    }
}

fn is_parameter_name(
    arena: &NodeArena,
    parameters: &[NodeIndex],
    prev: NodeIndex,
    node: NodeIndex,
) -> bool {
    parameters.contains(&prev)
        && matches!(
            arena.get(prev).map(|n| &n.data),
            Some(NodeData::Parameter { name: Some(name), .. }) if *name == node
        )
}

struct FunctionContext {
    node: NodeIndex,
    /// Class and name of the first parameter, for methods.
    receiver: Option<(NodeIndex, String)>,
}

struct Binder<'s> {
    state: &'s mut BinderState,
    scope: ScopeId,
    functions: Vec<FunctionContext>,
}

impl Binder<'_> {
    fn current_scope(&self) -> &Scope {
        &self.state.scopes[self.scope.index()]
    }

    fn push_scope(&mut self, kind: ScopeKind, node: NodeIndex) -> ScopeId {
        let outer = self.scope;
        self.scope = self.state.add_scope(kind, node, Some(outer));
        outer
    }

    /// Scope that receives a new binding of `name`.
    fn target_scope(&self, name: &str) -> ScopeId {
        let scope = self.current_scope();
        if scope.global_names.contains(name) {
            return self.state.module_scope();
        }
        if scope.nonlocal_names.contains(name) {
            let mut current = scope.parent;
            while let Some(id) = current {
                let outer = &self.state.scopes[id.index()];
                if outer.kind == ScopeKind::Function && outer.symbols.contains_key(name) {
                    return id;
                }
                current = outer.parent;
            }
        }
        self.scope
    }

    fn declare(&mut self, name: &str, declaration: Declaration) {
        if name.is_empty() {
            return;
        }
        let scope = self.target_scope(name);
        trace!(name, scope = scope.0, node = %declaration.node, "declare");
        self.state
            .node_declarations
            .insert(declaration.node, declaration.clone());
        self.state.scopes[scope.index()]
            .symbols
            .entry(name.to_string())
            .or_default()
            .declarations
            .push(declaration);
    }

    fn declare_name_node(&mut self, arena: &NodeArena, node: NodeIndex, declaration: Declaration) {
        if let Some(name) = arena.get(node).and_then(|n| n.name_value()) {
            let name = name.to_string();
            self.declare(&name, declaration);
        }
    }

    /// Declare every name bound by an assignment target.
    fn bind_target(
        &mut self,
        arena: &NodeArena,
        target: NodeIndex,
        source: Option<NodeIndex>,
        annotation: Option<NodeIndex>,
        path: &UnpackPath,
    ) {
        let Some(node) = arena.get(target) else {
            return;
        };
        match &node.data {
            NodeData::Name { value, .. } => {
                let declaration = Declaration {
                    kind: DeclarationKind::Variable,
                    node: target,
                    source,
                    annotation,
                    unpack_path: path.clone(),
                };
                let value = value.clone();
                self.declare(&value, declaration);
            }
            NodeData::TypeAnnotation {
                value_expression,
                annotation,
            } => {
                let (value_expression, annotation) = (*value_expression, *annotation);
                self.bind_target(arena, value_expression, source, Some(annotation), path);
            }
            NodeData::Tuple { expressions, .. } | NodeData::List { entries: expressions } => {
                for (i, &element) in expressions.iter().enumerate() {
                    let mut nested = path.clone();
                    nested.push(i as u32);
                    self.bind_target(arena, element, source, None, &nested);
                }
            }
            NodeData::Unpack { expression } => {
                // Starred targets collect a variable number of elements.
                let expression = *expression;
                self.bind_target(arena, expression, None, None, &UnpackPath::new());
            }
            NodeData::MemberAccess { left, member } => {
                self.bind_instance_variable(arena, target, *left, *member, source, annotation);
            }
            _ => {}
        }
    }

    fn bind_instance_variable(
        &mut self,
        arena: &NodeArena,
        target: NodeIndex,
        left: NodeIndex,
        member: NodeIndex,
        source: Option<NodeIndex>,
        annotation: Option<NodeIndex>,
    ) {
        let Some((class_node, receiver)) = self
            .functions
            .last()
            .and_then(|function| function.receiver.as_ref())
        else {
            return;
        };
        if arena.get(left).and_then(|n| n.name_value()) != Some(receiver.as_str()) {
            return;
        }
        let Some(member_name) = arena.get(member).and_then(|n| n.name_value()) else {
            return;
        };
        let declaration = Declaration {
            kind: DeclarationKind::Variable,
            node: target,
            source,
            annotation,
            unpack_path: UnpackPath::new(),
        };
        self.state
            .node_declarations
            .insert(target, declaration.clone());
        self.state
            .instance_variables
            .entry(*class_node)
            .or_default()
            .entry(member_name.to_string())
            .or_default()
            .push(declaration);
    }

    /// Value node at the far right of a chained assignment.
    fn assigned_value(arena: &NodeArena, mut right: NodeIndex) -> NodeIndex {
        while let Some(NodeData::Assignment { right: inner, .. }) = arena.get(right).map(|n| &n.data)
        {
            right = *inner;
        }
        right
    }

    fn bind_class(&mut self, arena: &NodeArena, node: NodeIndex) {
        let Some(NodeData::Class {
            decorators,
            name,
            arguments,
            suite,
        }) = arena.get(node).map(|n| &n.data)
        else {
            return;
        };
        for &child in decorators.iter().chain(arguments) {
            self.walk(arena, child);
        }
        self.declare_name_node(arena, *name, Declaration::new(DeclarationKind::Class, node));

        let outer = self.push_scope(ScopeKind::Class, node);
        self.walk(arena, *suite);
        self.scope = outer;
    }

    fn bind_function(&mut self, arena: &NodeArena, node: NodeIndex) {
        let Some(NodeData::Function {
            decorators,
            name,
            parameters,
            return_annotation,
            suite,
            ..
        }) = arena.get(node).map(|n| &n.data)
        else {
            return;
        };
        for &decorator in decorators {
            self.walk(arena, decorator);
        }
        self.walk_parameter_defaults(arena, parameters);
        if let Some(annotation) = *return_annotation {
            self.walk(arena, annotation);
        }
        self.declare_name_node(
            arena,
            *name,
            Declaration::new(DeclarationKind::Function, node),
        );

        let receiver = (self.current_scope().kind == ScopeKind::Class)
            .then(|| {
                let first = parameters.first()?;
                let NodeData::Parameter { name: Some(param_name), .. } = &arena.get(*first)?.data
                else {
                    return None;
                };
                let text = arena.get(*param_name)?.name_value()?;
                Some((self.current_scope().node, text.to_string()))
            })
            .flatten();

        let outer = self.push_scope(ScopeKind::Function, node);
        self.declare_parameters(arena, parameters);
        self.functions.push(FunctionContext { node, receiver });
        self.walk(arena, *suite);
        self.functions.pop();
        self.scope = outer;
    }

    fn bind_lambda(&mut self, arena: &NodeArena, node: NodeIndex) {
        let Some(NodeData::Lambda {
            parameters,
            expression,
        }) = arena.get(node).map(|n| &n.data)
        else {
            return;
        };
        self.walk_parameter_defaults(arena, parameters);
        let outer = self.push_scope(ScopeKind::Lambda, node);
        self.declare_parameters(arena, parameters);
        self.functions.push(FunctionContext {
            node,
            receiver: None,
        });
        self.walk(arena, *expression);
        self.functions.pop();
        self.scope = outer;
    }

    fn walk_parameter_defaults(&mut self, arena: &NodeArena, parameters: &[NodeIndex]) {
        for &param in parameters {
            if let Some(NodeData::Parameter {
                annotation,
                default_value,
                ..
            }) = arena.get(param).map(|n| &n.data)
            {
                for child in annotation.iter().chain(default_value) {
                    self.walk(arena, *child);
                }
            }
        }
    }

    fn declare_parameters(&mut self, arena: &NodeArena, parameters: &[NodeIndex]) {
        for &param in parameters {
            if let Some(NodeData::Parameter {
                name: Some(name),
                annotation,
                ..
            }) = arena.get(param).map(|n| &n.data)
            {
                let declaration = Declaration {
                    annotation: *annotation,
                    ..Declaration::new(DeclarationKind::Parameter, param)
                };
                self.declare_name_node(arena, *name, declaration);
            }
        }
    }

    fn bind_comprehension(&mut self, arena: &NodeArena, node: NodeIndex) {
        let Some(NodeData::ListComprehension {
            expression,
            comprehensions,
        }) = arena.get(node).map(|n| &n.data)
        else {
            return;
        };
        if let Some(&first) = comprehensions.first()
            && let Some(NodeData::ListComprehensionFor { iterable, .. }) =
                arena.get(first).map(|n| &n.data)
        {
            self.walk(arena, *iterable);
        }

        let outer = self.push_scope(ScopeKind::Comprehension, node);
        for (i, &clause) in comprehensions.iter().enumerate() {
            match arena.get(clause).map(|n| &n.data) {
                Some(NodeData::ListComprehensionFor {
                    target, iterable, ..
                }) => {
                    self.bind_target(arena, *target, Some(clause), None, &UnpackPath::new());
                    self.walk(arena, *target);
                    if i > 0 {
                        self.walk(arena, *iterable);
                    }
                }
                Some(_) => self.walk(arena, clause),
                None => {}
            }
        }
        self.walk(arena, *expression);
        self.scope = outer;
    }

    fn bind_imports(&mut self, arena: &NodeArena, node: NodeIndex) {
        match arena.get(node).map(|n| &n.data) {
            Some(NodeData::ImportAs { module, alias }) => {
                let bound = match alias {
                    Some(alias) => *alias,
                    None => match arena.get(*module).map(|n| &n.data) {
                        Some(NodeData::ModuleName { name_parts, .. }) => {
                            match name_parts.first() {
                                Some(first) => *first,
                                None => return,
                            }
                        }
                        _ => return,
                    },
                };
                self.declare_name_node(arena, bound, Declaration::new(DeclarationKind::Alias, node));
            }
            Some(NodeData::ImportFromAs { name, alias }) => {
                let bound = alias.unwrap_or(*name);
                self.declare_name_node(arena, bound, Declaration::new(DeclarationKind::Alias, node));
            }
            _ => {}
        }
    }
}

impl ParseTreeWalker for Binder<'_> {
    fn visit_node(&mut self, arena: &NodeArena, node: NodeIndex) -> bool {
        let Some(data) = arena.get(node).map(|n| &n.data) else {
            return false;
        };
        match data {
            NodeData::Class { .. } => {
                self.bind_class(arena, node);
                false
            }
            NodeData::Function { .. } => {
                self.bind_function(arena, node);
                false
            }
            NodeData::Lambda { .. } => {
                self.bind_lambda(arena, node);
                false
            }
            NodeData::ListComprehension { .. } => {
                self.bind_comprehension(arena, node);
                false
            }
            NodeData::Assignment { left, right } => {
                let value = Self::assigned_value(arena, *right);
                self.bind_target(arena, *left, Some(value), None, &UnpackPath::new());
                true
            }
            NodeData::TypeAnnotation {
                value_expression,
                annotation,
            } => {
                // A bare `x: int` statement declares without assigning.
                let is_statement = arena
                    .parent(node)
                    .and_then(|parent| arena.kind(parent))
                    .is_some_and(|kind| kind == NodeKind::StatementList);
                if is_statement {
                    self.bind_target(
                        arena,
                        *value_expression,
                        None,
                        Some(*annotation),
                        &UnpackPath::new(),
                    );
                }
                true
            }
            NodeData::AugmentedAssignment { left, .. } => {
                self.bind_target(arena, *left, Some(node), None, &UnpackPath::new());
                true
            }
            NodeData::AssignmentExpression { name, right } => {
                let (name, right) = (*name, *right);
                // Walrus targets bind in the nearest non-comprehension scope.
                let saved = self.scope;
                while self.current_scope().kind == ScopeKind::Comprehension
                    && let Some(parent) = self.current_scope().parent
                {
                    self.scope = parent;
                }
                self.bind_target(arena, name, Some(right), None, &UnpackPath::new());
                self.scope = saved;
                true
            }
            NodeData::For { target, .. } => {
                self.bind_target(arena, *target, Some(node), None, &UnpackPath::new());
                true
            }
            NodeData::WithItem {
                target: Some(target),
                ..
            } => {
                self.bind_target(arena, *target, Some(node), None, &UnpackPath::new());
                true
            }
            NodeData::Except {
                name: Some(name), ..
            } => {
                let declaration = Declaration {
                    source: Some(node),
                    ..Declaration::new(DeclarationKind::Variable, *name)
                };
                self.declare_name_node(arena, *name, declaration);
                true
            }
            NodeData::ImportAs { .. } | NodeData::ImportFromAs { .. } => {
                self.bind_imports(arena, node);
                false
            }
            NodeData::ImportFrom { .. } => true,
            NodeData::Global { names } | NodeData::Nonlocal { names } => {
                let is_global = matches!(data, NodeData::Global { .. });
                let texts: Vec<String> = names
                    .iter()
                    .filter_map(|&n| arena.get(n)?.name_value().map(str::to_string))
                    .collect();
                let scope = &mut self.state.scopes[self.scope.index()];
                let set = if is_global {
                    &mut scope.global_names
                } else {
                    &mut scope.nonlocal_names
                };
                set.extend(texts);
                false
            }
            NodeData::Return { .. } => {
                if let Some(function) = self.functions.last() {
                    self.state
                        .function_returns
                        .entry(function.node)
                        .or_default()
                        .push(node);
                }
                true
            }
            NodeData::Yield { .. } | NodeData::YieldFrom { .. } => {
                if let Some(function) = self.functions.last() {
                    self.state
                        .function_yields
                        .entry(function.node)
                        .or_default()
                        .push(node);
                }
                true
            }
            _ => true,
        }
    }
}
