//! Calls, member lookup and inferred return types.

use crate::state::CheckerState;
use pyz_parser::{ArgumentCategory, NodeArena, NodeData, NodeIndex, ParameterCategory};
use pyz_scanner::KeywordKind;
use pyz_solver::{
    ClassDetailId, ClassTypeFlags, FunctionDetailId, FunctionTypeFlags, LiteralValue,
    ParamSpecEntry, RecursionResult, Type, TypeFlags, TypeId, TypeKind, TypeVarDetail, Variance,
};
use rustc_hash::FxHashMap;
use tracing::trace;

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Call expressions
    // =========================================================================

    pub(crate) fn call_type(
        &mut self,
        node: NodeIndex,
        left: NodeIndex,
        arguments: &[NodeIndex],
    ) -> TypeId {
        let arena = self.arena;
        let callee = self.type_of_expression(left);

        let mut positional = Vec::with_capacity(arguments.len());
        for &argument in arguments {
            let Some(NodeData::Argument {
                category,
                name,
                value,
            }) = arena.get(argument).map(|n| &n.data)
            else {
                continue;
            };
            let ty = self.type_of_expression(*value);
            if name.is_none() && *category == ArgumentCategory::Simple {
                positional.push(ty);
            }
        }

        if self.is_class_object(callee, self.builtins.type_var) {
            return self.create_type_var(node, arguments);
        }
        if self.is_class_object(callee, self.builtins.type_class) && arguments.len() == 1 {
            return match positional.first().and_then(|&arg| self.class_and_literal(arg)) {
                Some((details, _)) => self.types.class_type(details),
                None => self.unknown(),
            };
        }
        self.call_result(callee, &positional)
    }

    /// `T = TypeVar("T", bound=..., covariant=...)`.
    fn create_type_var(&mut self, node: NodeIndex, arguments: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let mut name = String::new();
        let mut constraints = Vec::new();
        let mut bound_type = None;
        let mut variance = Variance::Invariant;

        for (position, &argument) in arguments.iter().enumerate() {
            let Some(NodeData::Argument {
                name: keyword,
                value,
                ..
            }) = arena.get(argument).map(|n| &n.data)
            else {
                continue;
            };
            match keyword.and_then(|k| arena.get(k)?.name_value()) {
                None if position == 0 => {
                    let ty = self.type_of_expression(*value);
                    if let Some((_, Some(LiteralValue::Str(text)))) = self.class_and_literal(ty) {
                        name = text;
                    }
                }
                None => constraints.push(self.type_of_annotation(*value)),
                Some("bound") => bound_type = Some(self.type_of_annotation(*value)),
                Some("covariant") if is_true_constant(arena.get(*value).map(|n| &n.data)) => {
                    variance = Variance::Covariant;
                }
                Some("contravariant") if is_true_constant(arena.get(*value).map(|n| &n.data)) => {
                    variance = Variance::Contravariant;
                }
                Some(_) => {}
            }
        }

        trace!(node = %node, name = %name, ?variance, "created TypeVar");
        let details = self.types.add_type_var(TypeVarDetail {
            name,
            constraints,
            bound_type,
            variance,
        });
        self.types.add_type(Type::new(
            TypeFlags::INSTANTIABLE,
            TypeKind::TypeVar {
                details,
                scope_id: None,
                name_with_scope: None,
            },
        ))
    }

    /// Result of calling a value of type `callee` with positional arguments
    /// of the given types.
    pub(crate) fn call_result(&mut self, callee: TypeId, args: &[TypeId]) -> TypeId {
        let Some(resolved) = self.types.get(callee) else {
            return self.unknown();
        };
        let is_instantiable = resolved.is_instantiable();
        match resolved.kind.clone() {
            TypeKind::Class {
                details,
                type_arguments,
                ..
            } if is_instantiable => {
                let is_special = self
                    .types
                    .class(details)
                    .is_some_and(|class| class.flags.contains(ClassTypeFlags::SPECIAL_BUILT_IN));
                if is_special {
                    return self.unknown();
                }
                match type_arguments {
                    Some(arguments) => self.types.specialized_instance(details, arguments),
                    None => self.types.class_instance(details),
                }
            }
            TypeKind::Class { .. } => self
                .call_member(callee, "__call__", args)
                .unwrap_or_else(|| self.unknown()),
            TypeKind::Function {
                details,
                bound_to_type,
                ..
            } => {
                let skip = self.receiver_parameter_count(details, bound_to_type.is_some());
                self.function_call_result(details, args, skip)
            }
            TypeKind::OverloadedFunction { overloads } => {
                let chosen = overloads
                    .iter()
                    .copied()
                    .find(|&overload| self.accepts_argument_count(overload, args.len()))
                    .or_else(|| overloads.last().copied());
                match chosen {
                    Some(overload) => self.call_result(overload, args),
                    None => self.unknown(),
                }
            }
            TypeKind::Union { subtypes } => {
                let results: Vec<TypeId> = subtypes
                    .iter()
                    .map(|&subtype| self.call_result(subtype, args))
                    .collect();
                self.types.union(&results)
            }
            TypeKind::Any => self.types.any(),
            _ => self.unknown(),
        }
    }

    /// Parameters a bound method's receiver fills.
    fn receiver_parameter_count(&self, details: FunctionDetailId, is_bound: bool) -> usize {
        let is_static = self
            .types
            .function(details)
            .is_some_and(|f| f.flags.contains(FunctionTypeFlags::STATIC_METHOD));
        usize::from(is_bound && !is_static)
    }

    fn accepts_argument_count(&self, function: TypeId, count: usize) -> bool {
        let Some(TypeKind::Function {
            details,
            bound_to_type,
            ..
        }) = self.types.get(function).map(|t| &t.kind)
        else {
            return false;
        };
        let skip = self.receiver_parameter_count(*details, bound_to_type.is_some());
        let Some(detail) = self.types.function(*details) else {
            return false;
        };
        let params = detail.parameters.iter().skip(skip);
        let mut required = 0;
        let mut maximum = 0;
        for param in params {
            match param.category {
                ParameterCategory::Simple if param.name.is_some() => {
                    maximum = usize::saturating_add(maximum, 1);
                    if !param.has_default {
                        required += 1;
                    }
                }
                ParameterCategory::VarArgList => maximum = usize::MAX,
                _ => {}
            }
        }
        (required..=maximum).contains(&count)
    }

    /// Return type of a call: the declared return type (or the inferred one)
    /// with TypeVars solved from the arguments.
    fn function_call_result(
        &mut self,
        details: FunctionDetailId,
        args: &[TypeId],
        skip: usize,
    ) -> TypeId {
        let Some(detail) = self.types.function(details) else {
            return self.unknown();
        };
        let flags = detail.flags;
        let declared = detail.declared_return_type;
        let params: Vec<(ParameterCategory, TypeId)> = detail
            .parameters
            .iter()
            .skip(skip)
            .map(|param| (param.category, param.type_id))
            .collect();

        let mut return_type = match declared {
            Some(declared) => declared,
            None => self.inferred_return_type(details),
        };

        let mut solutions: FxHashMap<TypeId, TypeId> = FxHashMap::default();
        for (&(category, param_type), &arg) in params.iter().zip(args) {
            if category != ParameterCategory::Simple {
                break;
            }
            if matches!(
                self.types.get(param_type).map(|t| &t.kind),
                Some(TypeKind::TypeVar { .. })
            ) && !solutions.contains_key(&param_type)
            {
                let widened = self.strip_literal(arg);
                solutions.insert(param_type, widened);
            }
        }
        if !solutions.is_empty() {
            return_type = self.apply_solutions(return_type, &solutions);
        }

        if flags.contains(FunctionTypeFlags::ASYNC) {
            let any = self.types.any();
            return_type = self
                .types
                .specialized_instance(self.builtins.coroutine, vec![any, any, return_type]);
        }
        return_type
    }

    fn apply_solutions(&mut self, ty: TypeId, solutions: &FxHashMap<TypeId, TypeId>) -> TypeId {
        if let Some(&solved) = solutions.get(&ty) {
            return solved;
        }
        let Some(resolved) = self.types.get(ty) else {
            return ty;
        };
        let flags = resolved.flags;
        match resolved.kind.clone() {
            TypeKind::Class {
                details,
                type_arguments: Some(arguments),
                ..
            } => {
                let applied: Vec<TypeId> = arguments
                    .iter()
                    .map(|&argument| self.apply_solutions(argument, solutions))
                    .collect();
                if applied == arguments {
                    ty
                } else if flags.contains(TypeFlags::INSTANTIABLE) {
                    self.types.specialized_class(details, applied)
                } else {
                    self.types.specialized_instance(details, applied)
                }
            }
            TypeKind::Union { subtypes } => {
                let applied: Vec<TypeId> = subtypes
                    .iter()
                    .map(|&subtype| self.apply_solutions(subtype, solutions))
                    .collect();
                if applied == subtypes {
                    ty
                } else {
                    self.types.union(&applied)
                }
            }
            _ => ty,
        }
    }

    // =========================================================================
    // Inferred return types
    // =========================================================================

    /// Return type of a function without a return annotation, inferred from
    /// its body.
    pub(crate) fn inferred_return_type(&mut self, details: FunctionDetailId) -> TypeId {
        if let Some(&cached) = self.inferred_returns.get(&details) {
            return cached;
        }
        let Some(node) = self.types.function(details).and_then(|f| f.declaration) else {
            return self.unknown();
        };
        match self.return_guard.enter(details) {
            RecursionResult::Entered => {}
            denied => {
                trace!(node = %node, ?denied, "return inference re-entered");
                return self.types.incomplete_unknown();
            }
        }
        let ty = self.infer_return_type_of_node(node);
        self.return_guard.leave(details);
        self.inferred_returns.insert(details, ty);
        ty
    }

    fn infer_return_type_of_node(&mut self, node: NodeIndex) -> TypeId {
        let arena = self.arena;
        let binder = self.binder;
        let suite = match arena.get(node).map(|n| &n.data) {
            Some(NodeData::Lambda { expression, .. }) => return self.type_of_expression(*expression),
            Some(NodeData::Function { suite, .. }) => *suite,
            _ => return self.unknown(),
        };

        let mut returned = Vec::new();
        for &statement in binder.returns_of(node) {
            let ty = match arena.get(statement).map(|n| &n.data) {
                Some(NodeData::Return {
                    expression: Some(expression),
                }) => self.type_of_expression(*expression),
                _ => self.types.none(),
            };
            returned.push(ty);
        }
        if falls_through(arena, suite) {
            returned.push(self.types.none());
        }

        if binder.is_generator(node) {
            let mut yielded = Vec::new();
            for &expression in binder.yields_of(node) {
                let ty = match arena.get(expression).map(|n| &n.data) {
                    Some(NodeData::Yield {
                        expression: Some(value),
                    }) => self.type_of_expression(*value),
                    Some(NodeData::YieldFrom { expression: value }) => {
                        let iterable = self.type_of_expression(*value);
                        self.iterated_type(iterable)
                    }
                    _ => self.types.none(),
                };
                yielded.push(ty);
            }
            let yield_type = self.types.union(&yielded);
            let return_type = if returned.is_empty() {
                self.types.none()
            } else {
                self.types.union(&returned)
            };
            let any = self.types.any();
            return self.types.specialized_instance(
                self.builtins.generator,
                vec![yield_type, any, return_type],
            );
        }

        // An empty list means every path raises.
        self.types.union(&returned)
    }

    // =========================================================================
    // Member access
    // =========================================================================

    /// Type of attribute `name` on a value of type `object`, with methods
    /// bound to it. `None` if the attribute does not exist.
    pub(crate) fn member_type_of(&mut self, object: TypeId, name: &str) -> Option<TypeId> {
        let resolved = self.types.get(object)?;
        let is_instantiable = resolved.is_instantiable();
        match resolved.kind.clone() {
            TypeKind::Module { fields, .. } => fields.get(name).copied(),
            TypeKind::Class { details, .. } if is_instantiable => {
                if let Some(member) = self.types.lookup_class_member(details, name) {
                    return Some(self.bind_member(member, object, false));
                }
                let metaclass = self.types.class(details)?.effective_metaclass?;
                let meta_details = self.types.get(metaclass)?.class_details()?;
                let member = self.types.lookup_class_member(meta_details, name)?;
                Some(self.bind_member(member, object, true))
            }
            TypeKind::Class { details, .. } => {
                let member = self.types.lookup_class_member(details, name)?;
                Some(self.bind_member(member, object, true))
            }
            TypeKind::TypeVar { details, .. } => {
                let bound = self.types.type_var(details)?.bound_type;
                match bound {
                    Some(bound) => self.member_type_of(bound, name),
                    None => {
                        let object_instance = self.types.class_instance(self.builtins.object);
                        self.member_type_of(object_instance, name)
                    }
                }
            }
            TypeKind::None => {
                let object_instance = self.types.class_instance(self.builtins.object);
                self.member_type_of(object_instance, name)
            }
            TypeKind::Union { subtypes } => {
                let members: Vec<TypeId> = subtypes
                    .iter()
                    .filter_map(|&subtype| self.member_type_of(subtype, name))
                    .collect();
                (!members.is_empty()).then(|| self.types.union(&members))
            }
            TypeKind::Unknown { .. } => Some(self.unknown()),
            TypeKind::Any => Some(self.types.any()),
            _ => None,
        }
    }

    /// Bind a class member looked up through `object`. Properties read
    /// through an instance yield the getter's return type.
    fn bind_member(&mut self, member: TypeId, object: TypeId, bind_receiver: bool) -> TypeId {
        if let Some(&getter) = self.property_getters.get(&member) {
            return if bind_receiver {
                self.function_call_result(getter, &[], 1)
            } else {
                member
            };
        }
        let Some(TypeKind::Function {
            details,
            bound_to_type: None,
            ..
        }) = self.types.get(member).map(|t| &t.kind)
        else {
            return member;
        };
        let details = *details;
        let Some(detail) = self.types.function(details) else {
            return member;
        };
        let flags = detail.flags;
        if flags.contains(FunctionTypeFlags::STATIC_METHOD) {
            return member;
        }
        let receiver = if flags.contains(FunctionTypeFlags::CLASS_METHOD) {
            match self.class_and_literal(object) {
                Some((class, _)) => self.types.class_type(class),
                None => object,
            }
        } else if bind_receiver {
            object
        } else {
            return member;
        };

        let Some(detail) = self.types.function(details) else {
            return member;
        };
        let bound_parameters: Vec<ParamSpecEntry> = detail
            .parameters
            .iter()
            .skip(1)
            .map(|param| ParamSpecEntry {
                category: param.category,
                name: param.name.clone(),
                type_id: param.type_id,
            })
            .collect();
        self.types.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Function {
                details,
                bound_to_type: Some(receiver),
                bound_parameters: Some(bound_parameters),
            },
        ))
    }

    /// Call method `name` on `object`. `None` when there is no such member.
    pub(crate) fn call_member(
        &mut self,
        object: TypeId,
        name: &str,
        args: &[TypeId],
    ) -> Option<TypeId> {
        let member = self.member_type_of(object, name)?;
        Some(self.call_result(member, args))
    }

    /// Whether `ty` is the class object of `details` (possibly specialized).
    pub(crate) fn is_class_object(&self, ty: TypeId, details: ClassDetailId) -> bool {
        self.types
            .get(ty)
            .is_some_and(|t| t.is_instantiable() && t.class_details() == Some(details))
    }
}

fn is_true_constant(data: Option<&NodeData>) -> bool {
    matches!(
        data,
        Some(NodeData::Constant {
            keyword: KeywordKind::True
        })
    )
}

/// Whether control can reach the end of a block.
fn falls_through(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.get(node).map(|n| &n.data) {
        Some(NodeData::Suite { statements }) => statements
            .last()
            .is_none_or(|&last| falls_through(arena, last)),
        Some(NodeData::StatementList { statements }) => !statements.last().is_some_and(|&last| {
            matches!(
                arena.get(last).map(|n| &n.data),
                Some(NodeData::Return { .. } | NodeData::Raise { .. })
            )
        }),
        Some(NodeData::If {
            if_suite,
            else_suite: Some(else_suite),
            ..
        }) => falls_through(arena, *if_suite) || falls_through(arena, *else_suite),
        _ => true,
    }
}
