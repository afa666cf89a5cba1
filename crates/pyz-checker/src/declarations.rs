//! `class` and `def` statements.
//!
//! Both are cached before their parts are evaluated, so a method that refers
//! to its own class (or a function that calls itself) sees the partially
//! built type instead of recursing.

use crate::binder::DeclarationKind;
use crate::state::CheckerState;
use pyz_parser::{NodeData, NodeIndex};
use pyz_solver::{
    ClassDetail, ClassTypeFlags, ClassTypeResult, FunctionDetail, FunctionParameter,
    FunctionTypeFlags, FunctionTypeResult, Type, TypeFlags, TypeId, TypeKind,
};
use tracing::{debug, trace};

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Classes
    // =========================================================================

    pub(crate) fn get_type_of_class_node(&mut self, node: NodeIndex) -> Option<ClassTypeResult> {
        if let Some(&cached) = self.class_results.get(&node) {
            return Some(cached);
        }
        let arena = self.arena;
        let binder = self.binder;
        let NodeData::Class {
            decorators,
            name,
            arguments,
            suite,
        } = &arena.get(node)?.data
        else {
            return None;
        };
        let class_name = arena
            .get(*name)
            .and_then(|n| n.name_value())
            .unwrap_or_default();

        let mut detail = ClassDetail::new(
            class_name,
            &self.module_name,
            ClassTypeFlags::PARTIALLY_EVALUATED,
        );
        detail.full_name = self.qualified_name(node, class_name);
        detail.declaration = Some(node);
        debug!(class = %detail.full_name, "evaluating class");
        let details = self.types.add_class(detail);
        let class_type = self.types.class_type(details);
        self.class_results.insert(
            node,
            ClassTypeResult {
                class_type,
                decorated_type: class_type,
            },
        );

        let mut base_classes = Vec::new();
        let mut declared_metaclass = None;
        let mut generic_parameters = None;
        let mut type_parameters = Vec::new();
        for &argument in arguments {
            let Some(NodeData::Argument {
                name: keyword,
                value,
                ..
            }) = arena.get(argument).map(|n| &n.data)
            else {
                continue;
            };
            let ty = self.type_of_expression(*value);
            match keyword.and_then(|k| arena.get(k)?.name_value()) {
                Some("metaclass") => declared_metaclass = Some(ty),
                Some(_) => {}
                None => {
                    if let Some(arguments) = self.type_arguments_of(ty) {
                        if self.is_class_object(ty, self.builtins.generic) {
                            generic_parameters = Some(arguments);
                        } else {
                            for argument in arguments {
                                self.collect_type_var(argument, &mut type_parameters);
                            }
                        }
                    }
                    base_classes.push(ty);
                }
            }
        }
        if base_classes.is_empty() {
            base_classes.push(self.types.class_type(self.builtins.object));
        }

        let mro = self.compute_mro(class_type, &base_classes);
        let effective_metaclass = declared_metaclass
            .or_else(|| {
                base_classes
                    .iter()
                    .find_map(|&base| self.types.class_of(base)?.effective_metaclass)
            })
            .unwrap_or_else(|| self.types.class_type(self.builtins.type_class));
        let inherited_flags = base_classes
            .iter()
            .filter_map(|&base| self.types.class_of(base))
            .fold(ClassTypeFlags::empty(), |flags, base| {
                flags | (base.flags & ClassTypeFlags::SUPPORTS_ABSTRACT_METHODS)
            });
        let doc_string = self.doc_string(*suite);
        if let Some(detail) = self.types.class_mut(details) {
            detail.flags |= inherited_flags;
            detail.base_classes = base_classes;
            detail.mro = mro;
            detail.declared_metaclass = declared_metaclass;
            detail.effective_metaclass = Some(effective_metaclass);
            detail.type_parameters = generic_parameters.unwrap_or(type_parameters);
            detail.doc_string = doc_string;
        }

        // Fields: class-level symbols, then `self.x` assignments from methods.
        if let Some(scope) = binder.scope_of_node(node).and_then(|id| binder.scope(id)) {
            for (field, symbol) in &scope.symbols {
                let ty = self.type_of_declarations(&symbol.declarations, node, false);
                if let Some(detail) = self.types.class_mut(details) {
                    detail.fields.insert(field.clone(), ty);
                }
            }
        }
        if let Some(variables) = binder.instance_variables.get(&node) {
            for (field, declarations) in variables {
                let declared = self
                    .types
                    .class(details)
                    .is_some_and(|detail| detail.fields.contains_key(field));
                if declared {
                    continue;
                }
                let ty = self.type_of_declarations(declarations, node, false);
                if let Some(detail) = self.types.class_mut(details) {
                    detail.fields.insert(field.clone(), ty);
                }
            }
        }
        if let Some(detail) = self.types.class_mut(details) {
            detail.flags.remove(ClassTypeFlags::PARTIALLY_EVALUATED);
        }

        let mut decorated_type = class_type;
        for &decorator in decorators.iter().rev() {
            let Some(NodeData::Decorator { expression }) = arena.get(decorator).map(|n| &n.data)
            else {
                continue;
            };
            let decorator_type = self.type_of_expression(*expression);
            let flag = match self.builtins.flag_decorator_name(decorator_type) {
                Some("final") => Some(ClassTypeFlags::FINAL),
                Some("runtime_checkable") => Some(ClassTypeFlags::RUNTIME_CHECKABLE),
                _ => None,
            };
            if let Some(flag) = flag {
                if let Some(detail) = self.types.class_mut(details) {
                    detail.flags |= flag;
                }
                continue;
            }
            let result = self.call_result(decorator_type, &[decorated_type]);
            if !self.is_unknown(result) {
                decorated_type = result;
            }
        }

        let result = ClassTypeResult {
            class_type,
            decorated_type,
        };
        self.class_results.insert(node, result);
        Some(result)
    }

    fn collect_type_var(&self, ty: TypeId, out: &mut Vec<TypeId>) {
        let Some(TypeKind::TypeVar { details, .. }) = self.types.get(ty).map(|t| &t.kind) else {
            return;
        };
        let seen = out.iter().any(|&existing| {
            matches!(
                self.types.get(existing).map(|t| &t.kind),
                Some(TypeKind::TypeVar { details: d, .. }) if d == details
            )
        });
        if !seen {
            out.push(ty);
        }
    }

    /// C3 linearization. The class itself comes first; an inconsistent
    /// hierarchy falls back to depth-first order.
    fn compute_mro(&self, class_type: TypeId, bases: &[TypeId]) -> Vec<TypeId> {
        let key = |ty: TypeId| match self.types.get(ty).and_then(Type::class_details) {
            Some(details) => (0u8, details.0),
            None => (1u8, ty.0),
        };
        let mut sequences: Vec<Vec<TypeId>> = bases
            .iter()
            .map(|&base| match self.types.class_of(base) {
                Some(class) if !class.mro.is_empty() => {
                    let mut mro = class.mro.clone();
                    mro[0] = base;
                    mro
                }
                _ => vec![base],
            })
            .collect();
        sequences.push(bases.to_vec());

        let mut mro = vec![class_type];
        loop {
            sequences.retain(|sequence| !sequence.is_empty());
            if sequences.is_empty() {
                break;
            }
            let next = sequences.iter().map(|sequence| sequence[0]).find(|&head| {
                !sequences
                    .iter()
                    .any(|sequence| sequence[1..].iter().any(|&ty| key(ty) == key(head)))
            });
            let Some(next) = next else {
                trace!("inconsistent class hierarchy");
                for &ty in sequences.iter().flatten() {
                    if !mro.iter().any(|&existing| key(existing) == key(ty)) {
                        mro.push(ty);
                    }
                }
                break;
            };
            mro.push(next);
            for sequence in &mut sequences {
                if key(sequence[0]) == key(next) {
                    sequence.remove(0);
                }
            }
        }
        mro
    }

    /// Leading string literal of a class or function body.
    fn doc_string(&self, suite: NodeIndex) -> Option<String> {
        let arena = self.arena;
        let NodeData::Suite { statements } = &arena.get(suite)?.data else {
            return None;
        };
        let NodeData::StatementList { statements } = &arena.get(*statements.first()?)?.data else {
            return None;
        };
        let NodeData::StringList { strings } = &arena.get(*statements.first()?)?.data else {
            return None;
        };
        let mut text = String::new();
        for &string in strings {
            match &arena.get(string)?.data {
                NodeData::String { value, .. } => text.push_str(value),
                _ => return None,
            }
        }
        Some(text)
    }

    pub(crate) fn is_unknown(&self, ty: TypeId) -> bool {
        matches!(
            self.types.get(ty).map(|t| &t.kind),
            Some(TypeKind::Unknown { .. }) | None
        )
    }

    // =========================================================================
    // Functions
    // =========================================================================

    pub(crate) fn get_type_of_function_node(
        &mut self,
        node: NodeIndex,
    ) -> Option<FunctionTypeResult> {
        if let Some(&cached) = self.function_results.get(&node) {
            return Some(cached);
        }
        let arena = self.arena;
        let binder = self.binder;
        let NodeData::Function {
            decorators,
            is_async,
            name,
            parameters,
            return_annotation,
            ..
        } = &arena.get(node)?.data
        else {
            return None;
        };
        let function_name = arena
            .get(*name)
            .and_then(|n| n.name_value())
            .unwrap_or_default();
        // Evaluating the class evaluates its methods, this one included.
        let class_details = self
            .find_enclosing_class(node)
            .and_then(|class_node| self.get_type_of_class_node(class_node))
            .and_then(|result| self.types.get(result.class_type)?.class_details());
        if let Some(&cached) = self.function_results.get(&node) {
            return Some(cached);
        }

        let mut flags = FunctionTypeFlags::empty();
        for &decorator in decorators {
            let Some(NodeData::Decorator { expression }) = arena.get(decorator).map(|n| &n.data)
            else {
                continue;
            };
            let decorator_type = self.type_of_expression(*expression);
            if self.is_class_object(decorator_type, self.builtins.staticmethod) {
                flags |= FunctionTypeFlags::STATIC_METHOD;
            } else if self.is_class_object(decorator_type, self.builtins.classmethod) {
                flags |= FunctionTypeFlags::CLASS_METHOD;
            }
            flags |= match self.builtins.flag_decorator_name(decorator_type) {
                Some("overload") => FunctionTypeFlags::OVERLOADED,
                Some("final") => FunctionTypeFlags::FINAL,
                Some("abstractmethod") => FunctionTypeFlags::ABSTRACT_METHOD,
                _ => FunctionTypeFlags::empty(),
            };
        }
        if *is_async {
            flags |= FunctionTypeFlags::ASYNC;
        }
        if binder.is_generator(node) {
            flags |= FunctionTypeFlags::GENERATOR;
        }
        if class_details.is_some() {
            match function_name {
                "__new__" => flags |= FunctionTypeFlags::CONSTRUCTOR_METHOD,
                "__init_subclass__" | "__class_getitem__" => {
                    flags |= FunctionTypeFlags::CLASS_METHOD;
                }
                _ => {}
            }
        }

        let full_name = self.qualified_name(node, function_name);
        let mut detail = FunctionDetail::new(function_name, &full_name, &self.module_name, flags);
        detail.declaration = Some(node);
        debug!(function = %full_name, "evaluating function");
        let details = self.types.add_function(detail);
        let function_type = self.types.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Function {
                details,
                bound_to_type: None,
                bound_parameters: None,
            },
        ));
        self.function_results.insert(
            node,
            FunctionTypeResult {
                function_type,
                decorated_type: function_type,
            },
        );

        let receiver =
            class_details.filter(|_| !flags.contains(FunctionTypeFlags::STATIC_METHOD));
        let mut function_parameters = Vec::with_capacity(parameters.len());
        let mut has_unannotated = false;
        for (position, &param) in parameters.iter().enumerate() {
            let Some(NodeData::Parameter {
                category,
                name,
                annotation,
                default_value,
            }) = arena.get(param).map(|n| &n.data)
            else {
                continue;
            };
            if let Some(default_value) = *default_value {
                self.type_of_expression(default_value);
            }
            let (type_id, has_declared_type) = match (annotation, receiver) {
                (Some(annotation), _) => (self.type_of_annotation(*annotation), true),
                (None, Some(class)) if position == 0 => {
                    let receiver_type = if flags.intersects(
                        FunctionTypeFlags::CLASS_METHOD | FunctionTypeFlags::CONSTRUCTOR_METHOD,
                    ) {
                        self.types.class_type(class)
                    } else {
                        self.types.class_instance(class)
                    };
                    (receiver_type, false)
                }
                (None, _) => {
                    has_unannotated |= name.is_some();
                    (self.unknown(), false)
                }
            };
            function_parameters.push(FunctionParameter {
                category: *category,
                name: name
                    .and_then(|name| arena.get(name)?.name_value())
                    .map(str::to_string),
                has_declared_type,
                type_id,
                has_default: default_value.is_some(),
            });
        }
        let declared_return_type =
            return_annotation.map(|annotation| self.type_of_annotation(annotation));
        if let Some(detail) = self.types.function_mut(details) {
            detail.parameters = function_parameters;
            detail.declared_return_type = declared_return_type;
            if has_unannotated {
                detail.flags |= FunctionTypeFlags::UNANNOTATED_PARAMS;
            }
        }

        let mut decorated_type = function_type;
        for &decorator in decorators.iter().rev() {
            let Some(NodeData::Decorator { expression }) = arena.get(decorator).map(|n| &n.data)
            else {
                continue;
            };
            let decorator_type = self.type_of_expression(*expression);
            if self.is_class_object(decorator_type, self.builtins.property) {
                let property = self.types.add_type(Type::new(
                    TypeFlags::INSTANCE,
                    TypeKind::Class {
                        details: self.builtins.property,
                        type_arguments: None,
                        literal_value: None,
                    },
                ));
                self.property_getters.insert(property, details);
                decorated_type = property;
                continue;
            }
            if let Some(property) = self.property_accessor_owner(*expression) {
                decorated_type = property;
                continue;
            }
            if self.is_class_object(decorator_type, self.builtins.staticmethod)
                || self.is_class_object(decorator_type, self.builtins.classmethod)
                || self.builtins.flag_decorator_name(decorator_type).is_some()
            {
                continue;
            }
            let result = self.call_result(decorator_type, &[decorated_type]);
            if !self.is_unknown(result) {
                decorated_type = result;
            }
        }

        if let Some(previous) = self.previous_overloads(node, function_name) {
            let mut overloads = previous;
            overloads.push(decorated_type);
            decorated_type = self.types.add_type(Type::new(
                TypeFlags::INSTANCE,
                TypeKind::OverloadedFunction { overloads },
            ));
        }

        let result = FunctionTypeResult {
            function_type,
            decorated_type,
        };
        self.function_results.insert(node, result);
        Some(result)
    }

    /// `@name.setter` / `@name.deleter` on an existing property: the
    /// property object itself.
    fn property_accessor_owner(&mut self, expression: NodeIndex) -> Option<TypeId> {
        let arena = self.arena;
        let NodeData::MemberAccess { left, member } = &arena.get(expression)?.data else {
            return None;
        };
        let accessor = arena.get(*member)?.name_value()?;
        if !matches!(accessor, "setter" | "deleter" | "getter") {
            return None;
        }
        let owner = self.type_of_expression(*left);
        self.property_getters.contains_key(&owner).then_some(owner)
    }

    /// Overloads declared immediately before `node` under the same name.
    fn previous_overloads(&mut self, node: NodeIndex, name: &str) -> Option<Vec<TypeId>> {
        let arena = self.arena;
        let binder = self.binder;
        let scope = binder.scope(binder.scope_containing(arena, node))?;
        let declarations = &scope.lookup(name)?.declarations;
        let position = declarations.iter().position(|decl| decl.node == node)?;
        let previous = declarations[..position].last()?;
        if previous.kind != DeclarationKind::Function {
            return None;
        }
        let previous_type = self.get_type_of_function_node(previous.node)?.decorated_type;
        match self.types.get(previous_type).map(|t| &t.kind) {
            Some(TypeKind::OverloadedFunction { overloads }) => {
                let overloads = overloads.clone();
                let last_is_overload = overloads
                    .last()
                    .is_some_and(|&last| self.is_overload_signature(last));
                last_is_overload.then_some(overloads)
            }
            Some(TypeKind::Function { .. }) if self.is_overload_signature(previous_type) => {
                Some(vec![previous_type])
            }
            _ => None,
        }
    }

    fn is_overload_signature(&self, ty: TypeId) -> bool {
        self.types
            .get(ty)
            .and_then(Type::function_details)
            .and_then(|details| self.types.function(details))
            .is_some_and(|detail| detail.flags.contains(FunctionTypeFlags::OVERLOADED))
    }
}
