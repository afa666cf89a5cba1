//! Expression type computation.

use crate::state::CheckerState;
use pyz_parser::{NodeData, NodeIndex, NodeKind};
use pyz_scanner::{KeywordKind, NumberValue, OperatorKind, StringFlags};
use pyz_solver::{
    ClassDetailId, ClassTypeFlags, FunctionDetail, FunctionParameter, FunctionTypeFlags,
    LiteralValue, Type, TypeFlags, TypeId, TypeKind,
};
use tracing::trace;

impl<'a> CheckerState<'a> {
    /// Dispatch on the node kind. `None` for nodes that are not values.
    pub(crate) fn compute_type_of_node(&mut self, node: NodeIndex) -> Option<TypeId> {
        let arena = self.arena;
        let data = &arena.get(node)?.data;
        let ty = match data {
            NodeData::Name { value, .. } => return self.get_type_of_name(node, value),
            NodeData::Number {
                value,
                is_imaginary,
                ..
            } => self.number_type(*value, *is_imaginary),
            NodeData::Constant { keyword } => self.constant_type(*keyword),
            NodeData::Ellipsis => self.types.class_instance(self.builtins.ellipsis),
            NodeData::StringList { strings } => self.string_list_type(strings),
            NodeData::String { .. } | NodeData::FormatString { .. } => {
                self.string_list_type(std::slice::from_ref(&node))
            }
            NodeData::Tuple { expressions, .. } => {
                let elements: Vec<TypeId> = expressions
                    .iter()
                    .map(|&element| self.type_of_expression(element))
                    .collect();
                self.types
                    .specialized_instance(self.builtins.tuple, elements)
            }
            NodeData::List { entries } => self.container_type(self.builtins.list, entries),
            NodeData::Set { entries } => self.container_type(self.builtins.set, entries),
            NodeData::Dictionary { entries } => self.dictionary_type(entries),
            NodeData::ListComprehension { expression, .. } => {
                // Standalone comprehensions are generator expressions.
                let element = self.type_of_expression(*expression);
                let element = self.strip_literal(element);
                let none = self.types.none();
                self.types
                    .specialized_instance(self.builtins.generator, vec![element, none, none])
            }
            NodeData::UnaryOperation {
                operator,
                expression,
                ..
            } => {
                let operand = self.type_of_expression(*expression);
                self.unary_operation_type(*operator, operand)
            }
            NodeData::BinaryOperation {
                operator,
                left,
                right,
                ..
            } => {
                let left = self.type_of_expression(*left);
                let right = self.type_of_expression(*right);
                self.binary_operation_type(*operator, left, right)
            }
            NodeData::Ternary {
                if_expression,
                else_expression,
                test,
            } => {
                self.type_of_expression(*test);
                let if_type = self.type_of_expression(*if_expression);
                let else_type = self.type_of_expression(*else_expression);
                self.types.union(&[if_type, else_type])
            }
            NodeData::AssignmentExpression { right, .. } => self.type_of_expression(*right),
            NodeData::TypeAnnotation { annotation, .. } => self.type_of_annotation(*annotation),
            NodeData::Await { expression } => {
                let awaitable = self.type_of_expression(*expression);
                self.awaited_type(awaitable)
            }
            NodeData::Unpack { expression } => {
                let iterable = self.type_of_expression(*expression);
                self.iterated_type(iterable)
            }
            NodeData::Yield { .. } | NodeData::YieldFrom { .. } => self.unknown(),
            NodeData::Call { left, arguments } => self.call_type(node, *left, arguments),
            NodeData::MemberAccess { left, member } => self.member_access_type(*left, *member),
            NodeData::Index { base, items } => self.index_type(node, *base, items),
            NodeData::Slice { .. } => self.types.class_instance(self.builtins.slice),
            NodeData::Lambda { parameters, .. } => self.lambda_type(node, parameters),
            NodeData::Error { child, .. } => {
                if let Some(child) = *child {
                    self.get_type_of_node(child);
                }
                self.unknown()
            }
            _ => return None,
        };
        Some(ty)
    }

    /// A `Name` node. Declaration names report the declared object;
    /// everything else is a lookup.
    fn get_type_of_name(&mut self, node: NodeIndex, value: &str) -> Option<TypeId> {
        let arena = self.arena;
        let binder = self.binder;
        if let Some(parent) = arena.parent(node)
            && let Some(parent_node) = arena.get(parent)
        {
            match &parent_node.data {
                NodeData::Function { name, .. } if *name == node => {
                    return self
                        .get_type_of_function_node(parent)
                        .map(|result| result.decorated_type);
                }
                NodeData::Class { name, .. } if *name == node => {
                    return self
                        .get_type_of_class_node(parent)
                        .map(|result| result.decorated_type);
                }
                NodeData::Parameter { name: Some(name), .. } if *name == node => {
                    return Some(self.parameter_type(parent));
                }
                NodeData::MemberAccess { member, .. } if *member == node => {
                    return self.get_type_of_node(parent);
                }
                NodeData::Argument { name: Some(name), .. } if *name == node => return None,
                NodeData::ModuleName { .. } => {
                    // `import a.b` names the module; `from a import b` does not.
                    let import = arena.parent(parent)?;
                    if arena.kind(import) != Some(NodeKind::ImportAs) {
                        return None;
                    }
                    return binder
                        .declaration(import)
                        .map(|decl| self.declaration_type(decl));
                }
                NodeData::ImportAs { .. } | NodeData::ImportFromAs { .. } => {
                    return binder
                        .declaration(parent)
                        .map(|decl| self.declaration_type(decl));
                }
                _ => {}
            }
        }

        if let Some(decl) = binder.declaration(node) {
            return Some(self.declaration_type(decl));
        }
        Some(self.lookup_name_type(node, value))
    }

    /// Declared type of a `Parameter` node, read from its function's detail.
    pub(crate) fn parameter_type(&mut self, param: NodeIndex) -> TypeId {
        let arena = self.arena;
        let Some(owner) = arena.parent(param) else {
            return self.unknown();
        };
        let (function_type, index) = match arena.get(owner).map(|n| &n.data) {
            Some(NodeData::Function { parameters, .. }) => {
                let Some(result) = self.get_type_of_function_node(owner) else {
                    return self.unknown();
                };
                (result.function_type, parameters.iter().position(|&p| p == param))
            }
            Some(NodeData::Lambda { parameters, .. }) => (
                self.type_of_expression(owner),
                parameters.iter().position(|&p| p == param),
            ),
            _ => return self.unknown(),
        };
        let Some(index) = index else {
            return self.unknown();
        };
        self.types
            .get(function_type)
            .and_then(Type::function_details)
            .and_then(|details| self.types.function(details))
            .and_then(|detail| detail.parameters.get(index))
            .map_or_else(|| self.unknown(), |param| param.type_id)
    }

    // =========================================================================
    // Literals and containers
    // =========================================================================

    fn number_type(&mut self, value: NumberValue, is_imaginary: bool) -> TypeId {
        match (value, is_imaginary) {
            (_, true) => self.types.class_instance(self.builtins.complex),
            (NumberValue::Int(v), false) => self
                .types
                .literal_instance(self.builtins.int, LiteralValue::Int(v)),
            (NumberValue::Float(_), false) => self.types.class_instance(self.builtins.float),
        }
    }

    fn constant_type(&mut self, keyword: KeywordKind) -> TypeId {
        match keyword {
            KeywordKind::True | KeywordKind::False => self.types.literal_instance(
                self.builtins.bool,
                LiteralValue::Bool(keyword == KeywordKind::True),
            ),
            KeywordKind::None => self.types.none(),
            KeywordKind::Debug => self.types.class_instance(self.builtins.bool),
            _ => self.unknown(),
        }
    }

    /// Adjacent string literals: `str` (literal unless formatted) or
    /// `bytes`.
    fn string_list_type(&mut self, strings: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let mut text = String::new();
        let mut is_literal = true;
        let mut is_bytes = false;
        for &string in strings {
            match arena.get(string).map(|n| &n.data) {
                Some(NodeData::String { token, value, .. }) => {
                    is_bytes |= token
                        .string_flags()
                        .is_some_and(|flags| flags.contains(StringFlags::BYTES));
                    text.push_str(value);
                }
                _ => is_literal = false,
            }
        }
        if is_bytes {
            self.types.class_instance(self.builtins.bytes)
        } else if is_literal {
            self.types
                .literal_instance(self.builtins.str, LiteralValue::Str(text))
        } else {
            self.types.class_instance(self.builtins.str)
        }
    }

    /// `list`/`set` display: the element type is the union of the entries
    /// with literals widened.
    fn container_type(&mut self, class: ClassDetailId, entries: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let mut elements = Vec::with_capacity(entries.len());
        for &entry in entries {
            let ty = match arena.get(entry).map(|n| &n.data) {
                Some(NodeData::Unpack { expression }) => {
                    let iterable = self.type_of_expression(*expression);
                    self.iterated_type(iterable)
                }
                Some(NodeData::ListComprehension { expression, .. }) => {
                    self.type_of_expression(*expression)
                }
                _ => self.type_of_expression(entry),
            };
            elements.push(self.strip_literal(ty));
        }
        let element = if elements.is_empty() {
            self.unknown()
        } else {
            self.types.union(&elements)
        };
        self.types.specialized_instance(class, vec![element])
    }

    fn dictionary_type(&mut self, entries: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for &entry in entries {
            let entry = match arena.get(entry).map(|n| &n.data) {
                Some(NodeData::ListComprehension { expression, .. }) => *expression,
                _ => entry,
            };
            match arena.get(entry).map(|n| &n.data) {
                Some(NodeData::DictionaryKeyEntry { key, value }) => {
                    let key = self.type_of_expression(*key);
                    let value = self.type_of_expression(*value);
                    keys.push(self.strip_literal(key));
                    values.push(self.strip_literal(value));
                }
                Some(NodeData::DictionaryExpandEntry { expression }) => {
                    let expanded = self.type_of_expression(*expression);
                    if let Some([key, value]) = self.type_arguments_of(expanded).as_deref() {
                        keys.push(*key);
                        values.push(*value);
                    }
                }
                _ => {}
            }
        }
        let key = if keys.is_empty() {
            self.unknown()
        } else {
            self.types.union(&keys)
        };
        let value = if values.is_empty() {
            self.unknown()
        } else {
            self.types.union(&values)
        };
        self.types
            .specialized_instance(self.builtins.dict, vec![key, value])
    }

    fn lambda_type(&mut self, node: NodeIndex, parameters: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let full_name = self.qualified_name(node, "lambda");
        let mut detail = FunctionDetail::new(
            "lambda",
            &full_name,
            &self.module_name,
            FunctionTypeFlags::empty(),
        );
        detail.declaration = Some(node);
        let unknown = self.unknown();
        for &param in parameters {
            if let Some(NodeData::Parameter {
                category,
                name,
                default_value,
                ..
            }) = arena.get(param).map(|n| &n.data)
            {
                detail.parameters.push(FunctionParameter {
                    category: *category,
                    name: name
                        .and_then(|name| arena.get(name)?.name_value())
                        .map(str::to_string),
                    has_declared_type: false,
                    type_id: unknown,
                    has_default: default_value.is_some(),
                });
            }
        }
        let details = self.types.add_function(detail);
        self.types.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Function {
                details,
                bound_to_type: None,
                bound_parameters: None,
            },
        ))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn unary_operation_type(&mut self, operator: OperatorKind, operand: TypeId) -> TypeId {
        if operator == OperatorKind::Not {
            return self.types.class_instance(self.builtins.bool);
        }
        if let Some((details, literal)) = self.class_and_literal(operand)
            && details == self.builtins.int
        {
            return match (operator, literal) {
                (OperatorKind::Subtract, Some(LiteralValue::Int(v))) => self
                    .types
                    .literal_instance(self.builtins.int, LiteralValue::Int(v.wrapping_neg())),
                (OperatorKind::Add, Some(LiteralValue::Int(_))) => operand,
                _ => self.types.class_instance(self.builtins.int),
            };
        }
        if let Some((details, _)) = self.class_and_literal(operand)
            && (details == self.builtins.float || details == self.builtins.complex)
            && matches!(operator, OperatorKind::Add | OperatorKind::Subtract)
        {
            return self.types.class_instance(details);
        }
        let dunder = match operator {
            OperatorKind::Subtract => "__neg__",
            OperatorKind::Add => "__pos__",
            OperatorKind::BitwiseInvert => "__invert__",
            _ => return self.unknown(),
        };
        self.call_member(operand, dunder, &[])
            .unwrap_or_else(|| self.unknown())
    }

    pub(crate) fn binary_operation_type(
        &mut self,
        operator: OperatorKind,
        left: TypeId,
        right: TypeId,
    ) -> TypeId {
        use OperatorKind::*;
        match operator {
            And | Or => return self.types.union(&[left, right]),
            _ if operator.is_comparison() => {
                return self.types.class_instance(self.builtins.bool);
            }
            _ => {}
        }

        let left_class = self.class_and_literal(left);
        let right_class = self.class_and_literal(right);
        if let (Some((left_details, left_literal)), Some((right_details, right_literal))) =
            (left_class, right_class)
        {
            if let (Some(left_rank), Some(right_rank)) = (
                self.numeric_rank(left_details),
                self.numeric_rank(right_details),
            ) {
                return self.arithmetic_type(
                    operator,
                    (left_rank, left_literal),
                    (right_rank, right_literal),
                );
            }
            let str_class = self.builtins.str;
            match operator {
                Add if left_details == str_class && right_details == str_class => {
                    return self.types.class_instance(str_class);
                }
                Multiply
                    if (left_details == str_class && right_details == self.builtins.int)
                        || (left_details == self.builtins.int && right_details == str_class) =>
                {
                    return self.types.class_instance(str_class);
                }
                Mod if left_details == str_class => return self.types.class_instance(str_class),
                Add if left_details == self.builtins.list && right_details == left_details => {
                    return self.strip_literal(left);
                }
                _ => {}
            }
        }

        let Some(dunder) = binary_dunder(operator) else {
            return self.unknown();
        };
        trace!(dunder, "binary operation falls back to dunder lookup");
        self.call_member(left, dunder, &[right])
            .unwrap_or_else(|| self.unknown())
    }

    /// Position of a builtin numeric class in the int < float < complex
    /// promotion order. `bool` counts as `int`.
    fn numeric_rank(&self, details: ClassDetailId) -> Option<u8> {
        let builtins = &self.builtins;
        if details == builtins.int || details == builtins.bool {
            Some(0)
        } else if details == builtins.float {
            Some(1)
        } else if details == builtins.complex {
            Some(2)
        } else {
            None
        }
    }

    fn arithmetic_type(
        &mut self,
        operator: OperatorKind,
        (left_rank, left_literal): (u8, Option<LiteralValue>),
        (right_rank, right_literal): (u8, Option<LiteralValue>),
    ) -> TypeId {
        use OperatorKind::*;
        let rank = left_rank.max(right_rank);
        let is_bitwise = matches!(
            operator,
            BitwiseAnd | BitwiseOr | BitwiseXor | LeftShift | RightShift
        );
        if is_bitwise && rank > 0 {
            return self.unknown();
        }
        if rank == 0 {
            if let (Some(LiteralValue::Int(a)), Some(LiteralValue::Int(b))) =
                (&left_literal, &right_literal)
            {
                let folded = match operator {
                    Add => a.checked_add(*b),
                    Subtract => a.checked_sub(*b),
                    Multiply => a.checked_mul(*b),
                    _ => None,
                };
                if let Some(value) = folded {
                    return self
                        .types
                        .literal_instance(self.builtins.int, LiteralValue::Int(value));
                }
            }
            if operator == Divide {
                return self.types.class_instance(self.builtins.float);
            }
            return self.types.class_instance(self.builtins.int);
        }
        let class = if rank == 1 {
            self.builtins.float
        } else {
            self.builtins.complex
        };
        self.types.class_instance(class)
    }

    pub(crate) fn augmented_assignment_type(
        &mut self,
        operator: OperatorKind,
        left: NodeIndex,
        right: NodeIndex,
    ) -> TypeId {
        let arena = self.arena;
        // The target's previous value, not the binding being created.
        let left_type = match arena.get(left).and_then(|n| n.name_value()) {
            Some(name) => self.lookup_name_type(left, name),
            None => self.type_of_expression(left),
        };
        let right_type = self.type_of_expression(right);
        match binary_operator_of(operator) {
            Some(binary) => self.binary_operation_type(binary, left_type, right_type),
            None => self.unknown(),
        }
    }

    // =========================================================================
    // Member access and subscripts
    // =========================================================================

    fn member_access_type(&mut self, left: NodeIndex, member: NodeIndex) -> TypeId {
        let arena = self.arena;
        let object = self.type_of_expression(left);
        let Some(name) = arena.get(member).and_then(|n| n.name_value()) else {
            return self.unknown();
        };
        self.member_type_of(object, name)
            .unwrap_or_else(|| self.unknown())
    }

    fn index_type(&mut self, node: NodeIndex, base: NodeIndex, items: &[NodeIndex]) -> TypeId {
        let base_type = self.type_of_expression(base);
        let Some(resolved) = self.types.get(base_type) else {
            return self.unknown();
        };
        if resolved.is_instantiable()
            && let TypeKind::Class { details, .. } = resolved.kind
        {
            // `list[int]` used as a value: a specialized class object.
            let is_special = self.types.class(details).is_some_and(|class| {
                class.flags.contains(ClassTypeFlags::SPECIAL_BUILT_IN)
                    && details != self.builtins.generic
            });
            if is_special {
                let annotation = self.type_of_annotation(node);
                return self.instantiable_form(annotation);
            }
            let values: Vec<NodeIndex> = items
                .iter()
                .filter_map(|&item| self.argument_value(item))
                .collect();
            let arguments: Vec<TypeId> = values
                .into_iter()
                .map(|value| self.type_of_annotation(value))
                .collect();
            return self.types.specialized_class(details, arguments);
        }

        let index_node = match items {
            [single] => self.argument_value(*single),
            _ => None,
        };
        let index_type = match index_node {
            Some(value) => self.type_of_expression(value),
            None => {
                let values: Vec<NodeIndex> = items
                    .iter()
                    .filter_map(|&item| self.argument_value(item))
                    .collect();
                let elements: Vec<TypeId> = values
                    .into_iter()
                    .map(|value| self.type_of_expression(value))
                    .collect();
                self.types.specialized_instance(self.builtins.tuple, elements)
            }
        };
        self.subscript_result(base_type, index_type)
    }

    fn subscript_result(&mut self, container: TypeId, index: TypeId) -> TypeId {
        let Some((details, _)) = self.class_and_literal(container) else {
            return self.unknown();
        };
        let index_is_slice = self
            .class_and_literal(index)
            .is_some_and(|(index_class, _)| index_class == self.builtins.slice);
        let arguments = self.type_arguments_of(container).unwrap_or_default();
        let builtins = &self.builtins;

        if details == builtins.str {
            return self.types.class_instance(builtins.str);
        }
        if details == builtins.list {
            if index_is_slice {
                return container;
            }
            return arguments.first().copied().unwrap_or_else(|| self.unknown());
        }
        if details == builtins.dict {
            return arguments.get(1).copied().unwrap_or_else(|| self.unknown());
        }
        if details == builtins.tuple {
            if index_is_slice {
                return self.types.class_instance(builtins.tuple);
            }
            if let Some((_, Some(LiteralValue::Int(position)))) = self.class_and_literal(index) {
                let position = if position < 0 {
                    arguments.len() as i64 + position
                } else {
                    position
                };
                if let Some(&element) = usize::try_from(position)
                    .ok()
                    .and_then(|p| arguments.get(p))
                {
                    return element;
                }
            }
            return if arguments.is_empty() {
                self.unknown()
            } else {
                self.types.union(&arguments)
            };
        }
        self.call_member(container, "__getitem__", &[index])
            .unwrap_or_else(|| self.unknown())
    }

    /// A type written as a value: class instances become class objects.
    fn instantiable_form(&mut self, ty: TypeId) -> TypeId {
        match self.types.get(ty) {
            Some(resolved) if resolved.is_instance() && resolved.class_details().is_some() => {
                let kind = resolved.kind.clone();
                self.types.add_type(Type::new(TypeFlags::INSTANTIABLE, kind))
            }
            _ => ty,
        }
    }

    // =========================================================================
    // Type helpers
    // =========================================================================

    /// Class detail and literal value of a class instance.
    pub(crate) fn class_and_literal(
        &self,
        ty: TypeId,
    ) -> Option<(ClassDetailId, Option<LiteralValue>)> {
        let resolved = self.types.get(ty)?;
        if !resolved.is_instance() {
            return None;
        }
        match &resolved.kind {
            TypeKind::Class {
                details,
                literal_value,
                ..
            } => Some((*details, literal_value.clone())),
            _ => None,
        }
    }

    pub(crate) fn type_arguments_of(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        match self.types.get(ty).map(|t| &t.kind) {
            Some(TypeKind::Class {
                type_arguments: Some(arguments),
                ..
            }) => Some(arguments.clone()),
            _ => None,
        }
    }

    /// Widen literal instances (`Literal[3]` becomes `int`).
    pub(crate) fn strip_literal(&mut self, ty: TypeId) -> TypeId {
        match self.types.get(ty).map(|t| &t.kind) {
            Some(TypeKind::Class {
                details,
                literal_value: Some(_),
                ..
            }) => {
                let details = *details;
                self.types.class_instance(details)
            }
            Some(TypeKind::Union { subtypes }) => {
                let subtypes = subtypes.clone();
                let stripped: Vec<TypeId> =
                    subtypes.iter().map(|&s| self.strip_literal(s)).collect();
                if stripped == subtypes {
                    ty
                } else {
                    self.types.union(&stripped)
                }
            }
            _ => ty,
        }
    }

    /// Element type produced by iterating over `ty`.
    pub(crate) fn iterated_type(&mut self, ty: TypeId) -> TypeId {
        if let Some(TypeKind::Union { subtypes }) = self.types.get(ty).map(|t| &t.kind) {
            let subtypes = subtypes.clone();
            let elements: Vec<TypeId> = subtypes.iter().map(|&s| self.iterated_type(s)).collect();
            return self.types.union(&elements);
        }
        let Some((details, _)) = self.class_and_literal(ty) else {
            return self.unknown();
        };
        let arguments = self.type_arguments_of(ty).unwrap_or_default();
        let builtins = &self.builtins;
        if details == builtins.str {
            self.types.class_instance(builtins.str)
        } else if details == builtins.bytes || details == builtins.range {
            self.types.class_instance(builtins.int)
        } else if details == builtins.tuple {
            if arguments.is_empty() {
                self.unknown()
            } else {
                self.types.union(&arguments)
            }
        } else if details == builtins.list
            || details == builtins.set
            || details == builtins.dict
            || details == builtins.generator
        {
            arguments.first().copied().unwrap_or_else(|| self.unknown())
        } else {
            self.unknown()
        }
    }

    fn awaited_type(&mut self, ty: TypeId) -> TypeId {
        match self.class_and_literal(ty) {
            Some((details, _)) if details == self.builtins.coroutine => self
                .type_arguments_of(ty)
                .and_then(|arguments| arguments.get(2).copied())
                .unwrap_or_else(|| self.unknown()),
            _ => self.unknown(),
        }
    }

    /// Instance type of an `except` clause's class (or tuple of classes).
    pub(crate) fn exception_instance(&mut self, caught: TypeId) -> TypeId {
        let Some(resolved) = self.types.get(caught) else {
            return self.unknown();
        };
        if resolved.is_instantiable()
            && let TypeKind::Class { details, .. } = resolved.kind
        {
            return self.types.class_instance(details);
        }
        if let Some((details, _)) = self.class_and_literal(caught)
            && details == self.builtins.tuple
        {
            let classes = self.type_arguments_of(caught).unwrap_or_default();
            let instances: Vec<TypeId> = classes
                .iter()
                .map(|&class| self.exception_instance(class))
                .collect();
            return self.types.union(&instances);
        }
        self.unknown()
    }
}

fn binary_dunder(operator: OperatorKind) -> Option<&'static str> {
    use OperatorKind::*;
    Some(match operator {
        Add => "__add__",
        Subtract => "__sub__",
        Multiply => "__mul__",
        MatrixMultiply => "__matmul__",
        Divide => "__truediv__",
        FloorDivide => "__floordiv__",
        Mod => "__mod__",
        Power => "__pow__",
        BitwiseAnd => "__and__",
        BitwiseOr => "__or__",
        BitwiseXor => "__xor__",
        LeftShift => "__lshift__",
        RightShift => "__rshift__",
        _ => return None,
    })
}

/// `+=` to `+` and so on.
fn binary_operator_of(operator: OperatorKind) -> Option<OperatorKind> {
    use OperatorKind::*;
    Some(match operator {
        AddEqual => Add,
        SubtractEqual => Subtract,
        MultiplyEqual => Multiply,
        MatrixMultiplyEqual => MatrixMultiply,
        DivideEqual => Divide,
        FloorDivideEqual => FloorDivide,
        ModEqual => Mod,
        PowerEqual => Power,
        BitwiseAndEqual => BitwiseAnd,
        BitwiseOrEqual => BitwiseOr,
        BitwiseXorEqual => BitwiseXor,
        LeftShiftEqual => LeftShift,
        RightShiftEqual => RightShift,
        _ => return None,
    })
}
