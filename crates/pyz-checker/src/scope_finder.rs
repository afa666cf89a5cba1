//! Name resolution and declaration types.

use crate::binder::{Declaration, DeclarationKind};
use crate::state::CheckerState;
use pyz_common::TextRange;
use pyz_parser::{NodeData, NodeIndex, NodeKind};
use pyz_solver::{RecursionResult, TypeId, TypeKind};
use tracing::trace;

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Enclosing nodes
    // =========================================================================

    /// Nearest `Function` or `Class` whose body contains `node`.
    pub(crate) fn find_enclosing_definition(&self, node: NodeIndex) -> Option<NodeIndex> {
        let scope = self.binder.scope_containing(self.arena, node);
        let mut current = Some(scope);
        while let Some(id) = current {
            let entry = self.binder.scope(id)?;
            if matches!(
                self.arena.kind(entry.node),
                Some(NodeKind::Function | NodeKind::Class)
            ) {
                return Some(entry.node);
            }
            current = entry.parent;
        }
        None
    }

    /// Class whose body directly contains the function `function`.
    pub(crate) fn find_enclosing_class(&self, function: NodeIndex) -> Option<NodeIndex> {
        let enclosing = self.find_enclosing_definition(function)?;
        (self.arena.kind(enclosing) == Some(NodeKind::Class)).then_some(enclosing)
    }

    /// Dotted name of a definition: module, enclosing classes and functions,
    /// then `name`.
    pub(crate) fn qualified_name(&self, definition: NodeIndex, name: &str) -> String {
        let mut parts = vec![name.to_string()];
        let mut current = self.find_enclosing_definition(definition);
        while let Some(outer) = current {
            let outer_name = match self.arena.get(outer).map(|n| &n.data) {
                Some(NodeData::Function { name, .. } | NodeData::Class { name, .. }) => self
                    .arena
                    .get(*name)
                    .and_then(|n| n.name_value())
                    .unwrap_or_default(),
                _ => "",
            };
            parts.push(outer_name.to_string());
            current = self.find_enclosing_definition(outer);
        }
        if !self.module_name.is_empty() {
            parts.push(self.module_name.clone());
        }
        parts.reverse();
        parts.join(".")
    }

    // =========================================================================
    // Name lookup
    // =========================================================================

    /// Type of the name `name` as seen from `usage`.
    pub(crate) fn lookup_name_type(&mut self, usage: NodeIndex, name: &str) -> TypeId {
        let binder = self.binder;
        let scope = binder.scope_containing(self.arena, usage);
        match binder.lookup_name(scope, name) {
            Some((found, symbol)) => {
                self.type_of_declarations(&symbol.declarations, usage, found == scope)
            }
            None => self.lookup_builtin_name(name),
        }
    }

    fn lookup_builtin_name(&mut self, name: &str) -> TypeId {
        if let Some(ty) = self.builtins.lookup(&self.types, name) {
            return ty;
        }
        if matches!(name, "__name__" | "__file__" | "__doc__") {
            return self.types.class_instance(self.builtins.str);
        }
        trace!(name, "unresolved name");
        self.unknown()
    }

    /// Pick the declaration(s) that reach `usage` and return their type.
    ///
    /// Within the declaring scope the closest preceding declaration wins.
    /// From another scope (or before any declaration) the declared type is
    /// used if there is one, otherwise the union of every inferred type.
    pub(crate) fn type_of_declarations(
        &mut self,
        declarations: &'a [Declaration],
        usage: NodeIndex,
        same_scope: bool,
    ) -> TypeId {
        let usage_start = self.arena.get(usage).map_or(0, |n| n.start);

        if same_scope {
            let preceding = declarations
                .iter()
                .filter(|decl| {
                    // A definition's own decorators and header cannot see it.
                    let ends_before = self
                        .arena
                        .get(decl.node)
                        .is_some_and(|n| n.end() <= usage_start);
                    let reads_itself = self
                        .declaration_value_range(decl)
                        .is_some_and(|range| range.overlaps_offset(usage_start));
                    ends_before && !reads_itself
                })
                .max_by_key(|decl| self.arena.get(decl.node).map_or(0, |n| n.start));
            if let Some(decl) = preceding {
                return self.declaration_type(decl);
            }
        }

        if let Some(last) = declarations.last()
            && matches!(
                last.kind,
                DeclarationKind::Function | DeclarationKind::Class | DeclarationKind::Alias
            )
        {
            return self.declaration_type(last);
        }
        if let Some(declared) = declarations.iter().find(|decl| decl.annotation.is_some()) {
            return self.declaration_type(declared);
        }

        let inferred: Vec<TypeId> = declarations
            .iter()
            .map(|decl| {
                let ty = self.declaration_type(decl);
                self.strip_literal(ty)
            })
            .collect();
        if inferred.is_empty() {
            return self.unknown();
        }
        self.types.union(&inferred)
    }

    /// Range of the expression a declaration reads its value from, so a
    /// name used inside its own assigned value resolves to the previous
    /// binding.
    fn declaration_value_range(&self, decl: &Declaration) -> Option<TextRange> {
        let source = decl.source?;
        let value = match &self.arena.get(source)?.data {
            NodeData::For { iterable, .. } | NodeData::ListComprehensionFor { iterable, .. } => {
                *iterable
            }
            NodeData::WithItem { expression, .. } => *expression,
            NodeData::Except {
                type_expression, ..
            } => (*type_expression)?,
            NodeData::AugmentedAssignment { right, .. } => *right,
            _ => source,
        };
        self.arena.range(value)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Type a declaration gives its symbol.
    pub(crate) fn declaration_type(&mut self, decl: &Declaration) -> TypeId {
        // Classes and functions cache themselves before evaluating their
        // parts, so they need no guard here.
        match decl.kind {
            DeclarationKind::Class => {
                return self
                    .get_type_of_class_node(decl.node)
                    .map_or_else(|| self.unknown(), |result| result.decorated_type);
            }
            DeclarationKind::Function => {
                return self
                    .get_type_of_function_node(decl.node)
                    .map_or_else(|| self.unknown(), |result| result.decorated_type);
            }
            _ => {}
        }
        if let Some(&cached) = self.declaration_types.get(&decl.node) {
            return cached;
        }
        match self.declaration_guard.enter(decl.node) {
            RecursionResult::Entered => {}
            denied => {
                trace!(node = %decl.node, ?denied, "declaration re-entered");
                return self.types.incomplete_unknown();
            }
        }

        let ty = match decl.kind {
            DeclarationKind::Class | DeclarationKind::Function => self.unknown(),
            DeclarationKind::Parameter => self.parameter_type(decl.node),
            DeclarationKind::Alias => self.import_type(decl.node),
            DeclarationKind::Variable => match decl.annotation {
                Some(annotation) => self.type_of_annotation(annotation),
                None => self.inferred_variable_type(decl),
            },
        };

        self.declaration_guard.leave(decl.node);
        self.declaration_types.insert(decl.node, ty);
        ty
    }

    fn inferred_variable_type(&mut self, decl: &Declaration) -> TypeId {
        let Some(source) = decl.source else {
            return self.unknown();
        };
        let arena = self.arena;
        let Some(data) = arena.get(source).map(|n| &n.data) else {
            return self.unknown();
        };
        let mut ty = match data {
            NodeData::For { iterable, .. } | NodeData::ListComprehensionFor { iterable, .. } => {
                let iterable = self.type_of_expression(*iterable);
                self.iterated_type(iterable)
            }
            NodeData::WithItem { expression, .. } => {
                let manager = self.type_of_expression(*expression);
                self.call_member(manager, "__enter__", &[])
                    .unwrap_or_else(|| self.unknown())
            }
            NodeData::Except {
                type_expression, ..
            } => match type_expression {
                Some(expression) => {
                    let caught = self.type_of_expression(*expression);
                    self.exception_instance(caught)
                }
                None => self.types.class_instance(self.builtins.base_exception),
            },
            NodeData::AugmentedAssignment {
                operator,
                left,
                right,
            } => self.augmented_assignment_type(*operator, *left, *right),
            _ => self.type_of_expression(source),
        };

        for &index in &decl.unpack_path {
            ty = self.unpacked_element_type(ty, index as usize);
        }
        ty
    }

    /// Type of element `index` when `ty` is unpacked into a target list.
    fn unpacked_element_type(&mut self, ty: TypeId, index: usize) -> TypeId {
        let Some(TypeKind::Class {
            details,
            type_arguments,
            ..
        }) = self.types.get(ty).map(|t| &t.kind)
        else {
            return self.unknown();
        };
        if *details == self.builtins.tuple {
            return type_arguments
                .as_ref()
                .and_then(|args| args.get(index).copied())
                .unwrap_or_else(|| self.unknown());
        }
        self.iterated_type(ty)
    }

    /// Type bound by an import: the synthesized modules and their members
    /// resolve, anything else is `Unknown`.
    fn import_type(&mut self, node: NodeIndex) -> TypeId {
        match self.arena.get(node).map(|n| &n.data) {
            Some(NodeData::ImportAs { module, .. }) => {
                let name = self.module_name_text(*module);
                self.builtins
                    .module(&name)
                    .unwrap_or_else(|| self.unknown())
            }
            Some(NodeData::ImportFromAs { name, .. }) => {
                let Some(import_from) = self.arena.parent(node) else {
                    return self.unknown();
                };
                let Some(NodeData::ImportFrom { module, .. }) =
                    self.arena.get(import_from).map(|n| &n.data)
                else {
                    return self.unknown();
                };
                let module_name = self.module_name_text(*module);
                let member = self
                    .arena
                    .get(*name)
                    .and_then(|n| n.name_value())
                    .unwrap_or_default();
                let Some(module_type) = self.builtins.module(&module_name) else {
                    trace!(module = %module_name, "unresolved import");
                    return self.unknown();
                };
                match self.types.get(module_type).map(|t| &t.kind) {
                    Some(TypeKind::Module { fields, .. }) => fields
                        .get(member)
                        .copied()
                        .unwrap_or_else(|| self.unknown()),
                    _ => self.unknown(),
                }
            }
            _ => self.unknown(),
        }
    }

    fn module_name_text(&self, module: NodeIndex) -> String {
        let Some(NodeData::ModuleName {
            leading_dots,
            name_parts,
            ..
        }) = self.arena.get(module).map(|n| &n.data)
        else {
            return String::new();
        };
        let parts: Vec<&str> = name_parts
            .iter()
            .filter_map(|&part| self.arena.get(part)?.name_value())
            .collect();
        format!("{}{}", ".".repeat(*leading_dots as usize), parts.join("."))
    }
}
