//! Type annotations.
//!
//! An annotation is evaluated like an expression and then converted to the
//! type it denotes: a class becomes an instance of that class, `None` the
//! None type, `X | Y` a union, and the `typing` special forms are expanded
//! here. TypeVars are specialized to the function or class that uses them.

use crate::state::CheckerState;
use pyz_parser::{NodeData, NodeIndex, NodeKind};
use pyz_scanner::{KeywordKind, NumberValue, OperatorKind, StringFlags};
use pyz_solver::{
    ClassTypeFlags, LiteralValue, Type, TypeFlags, TypeId, TypeKind, TypeVarDetailId,
};
use tracing::trace;

impl<'a> CheckerState<'a> {
    /// The type an annotation expression declares.
    pub(crate) fn type_of_annotation(&mut self, node: NodeIndex) -> TypeId {
        let arena = self.arena;
        let Some(data) = arena.get(node).map(|n| &n.data) else {
            return self.unknown();
        };
        match data {
            NodeData::Constant {
                keyword: KeywordKind::None,
            } => self.types.none(),
            NodeData::StringList { strings } => self.forward_reference_type(node, strings),
            NodeData::BinaryOperation {
                operator: OperatorKind::BitwiseOr,
                left,
                right,
                ..
            } => {
                let left = self.type_of_annotation(*left);
                let right = self.type_of_annotation(*right);
                self.types.union(&[left, right])
            }
            NodeData::Index { base, items } => self.subscripted_annotation_type(node, *base, items),
            _ => {
                let ty = self.type_of_expression(node);
                self.convert_to_instance(ty, node)
            }
        }
    }

    /// `"ClassName"` in an annotation refers to a name declared later.
    fn forward_reference_type(&mut self, node: NodeIndex, strings: &[NodeIndex]) -> TypeId {
        let arena = self.arena;
        let [string] = strings else {
            return self.unknown();
        };
        let Some(NodeData::String { value, token, .. }) = arena.get(*string).map(|n| &n.data)
        else {
            return self.unknown();
        };
        let is_bytes = token
            .string_flags()
            .is_some_and(|flags| flags.contains(StringFlags::BYTES));
        let name = value.trim();
        if is_bytes || name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            trace!(reference = %value, "unsupported forward reference");
            return self.unknown();
        }
        let ty = self.lookup_name_type(node, name);
        self.convert_to_instance(ty, node)
    }

    /// Turn the value of an annotation expression into the type it denotes.
    pub(crate) fn convert_to_instance(&mut self, ty: TypeId, context: NodeIndex) -> TypeId {
        let Some(resolved) = self.types.get(ty) else {
            return self.unknown();
        };
        match &resolved.kind {
            TypeKind::Class {
                details,
                type_arguments,
                ..
            } if resolved.is_instantiable() => {
                let details = *details;
                let type_arguments = type_arguments.clone();
                let Some(class) = self.types.class(details) else {
                    return self.unknown();
                };
                if class.flags.contains(ClassTypeFlags::SPECIAL_BUILT_IN) {
                    return match class.full_name.as_str() {
                        "typing.Any" => self.types.any(),
                        _ => self.unknown(),
                    };
                }
                match type_arguments {
                    Some(arguments) => self.types.specialized_instance(details, arguments),
                    None => self.types.class_instance(details),
                }
            }
            TypeKind::TypeVar { scope_id: None, .. } => self.scoped_type_var(ty, context),
            TypeKind::None | TypeKind::Unknown { .. } | TypeKind::Any => ty,
            TypeKind::TypeVar { .. } => ty,
            _ => self.unknown(),
        }
    }

    fn subscripted_annotation_type(
        &mut self,
        node: NodeIndex,
        base: NodeIndex,
        items: &[NodeIndex],
    ) -> TypeId {
        let base_type = self.type_of_expression(base);
        let Some((details, instantiable)) = self
            .types
            .get(base_type)
            .and_then(|ty| Some((ty.class_details()?, ty.is_instantiable())))
        else {
            return self.convert_to_instance(base_type, node);
        };
        if !instantiable {
            return self.unknown();
        }
        let values: Vec<NodeIndex> = items
            .iter()
            .filter_map(|&item| self.argument_value(item))
            .collect();
        let full_name = self
            .types
            .class(details)
            .map(|class| class.full_name.clone())
            .unwrap_or_default();

        match full_name.as_str() {
            "typing.Optional" => {
                let inner = match values.first() {
                    Some(&value) => self.type_of_annotation(value),
                    None => self.unknown(),
                };
                let none = self.types.none();
                self.types.union(&[inner, none])
            }
            "typing.Union" => {
                let members: Vec<TypeId> = values
                    .iter()
                    .map(|&value| self.type_of_annotation(value))
                    .collect();
                self.types.union(&members)
            }
            "typing.Literal" => {
                let members: Vec<TypeId> = values
                    .iter()
                    .map(|&value| self.literal_annotation_type(value))
                    .collect();
                self.types.union(&members)
            }
            "typing.Type" => {
                let inner = match values.first() {
                    Some(&value) => self.type_of_annotation(value),
                    None => return self.unknown(),
                };
                match self.types.get(inner).and_then(Type::class_details) {
                    Some(inner_details) => self.types.class_type(inner_details),
                    None => self.unknown(),
                }
            }
            "typing.ClassVar" | "typing.Final" => match values.first() {
                Some(&value) => self.type_of_annotation(value),
                None => self.unknown(),
            },
            _ if self
                .types
                .class(details)
                .is_some_and(|class| class.flags.contains(ClassTypeFlags::SPECIAL_BUILT_IN)) =>
            {
                self.unknown()
            }
            _ => {
                let arena = self.arena;
                let arguments: Vec<TypeId> = values
                    .iter()
                    .filter(|&&value| arena.kind(value) != Some(NodeKind::Ellipsis))
                    .map(|&value| self.type_of_annotation(value))
                    .collect();
                self.types.specialized_instance(details, arguments)
            }
        }
    }

    fn literal_annotation_type(&mut self, value: NodeIndex) -> TypeId {
        let arena = self.arena;
        match arena.get(value).map(|n| &n.data) {
            Some(NodeData::Number {
                value: NumberValue::Int(v),
                is_imaginary: false,
                ..
            }) => self
                .types
                .literal_instance(self.builtins.int, LiteralValue::Int(*v)),
            Some(NodeData::Constant {
                keyword: keyword @ (KeywordKind::True | KeywordKind::False),
            }) => self.types.literal_instance(
                self.builtins.bool,
                LiteralValue::Bool(*keyword == KeywordKind::True),
            ),
            Some(NodeData::Constant {
                keyword: KeywordKind::None,
            }) => self.types.none(),
            Some(NodeData::UnaryOperation {
                operator: OperatorKind::Subtract,
                expression,
                ..
            }) => match arena.get(*expression).map(|n| &n.data) {
                Some(NodeData::Number {
                    value: NumberValue::Int(v),
                    is_imaginary: false,
                    ..
                }) => self
                    .types
                    .literal_instance(self.builtins.int, LiteralValue::Int(v.wrapping_neg())),
                _ => self.unknown(),
            },
            Some(NodeData::StringList { .. }) => self.type_of_expression(value),
            _ => self.unknown(),
        }
    }

    /// Value expression of a subscript or call argument.
    pub(crate) fn argument_value(&self, argument: NodeIndex) -> Option<NodeIndex> {
        match self.arena.get(argument).map(|n| &n.data) {
            Some(NodeData::Argument { value, .. }) => Some(*value),
            _ => None,
        }
    }

    // =========================================================================
    // TypeVar scoping
    // =========================================================================

    /// Copy of an unscoped TypeVar bound to the definition that uses it at
    /// `context`. Module-level uses stay unscoped.
    pub(crate) fn scoped_type_var(&mut self, type_var: TypeId, context: NodeIndex) -> TypeId {
        let Some(TypeKind::TypeVar { details, .. }) = self.types.get(type_var).map(|t| &t.kind)
        else {
            return type_var;
        };
        let details = *details;
        let Some(scope_id) = self.type_var_scope_id(details, context) else {
            return type_var;
        };
        let key = (details, scope_id);
        if let Some(&existing) = self.scoped_type_vars.get(&key) {
            return existing;
        }
        let name = self
            .types
            .type_var(details)
            .map(|detail| detail.name.clone())
            .unwrap_or_default();
        let scoped = self.types.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::TypeVar {
                details,
                scope_id: Some(key.1.clone()),
                name_with_scope: Some(format!("{name}.{}", key.1)),
            },
        ));
        self.scoped_type_vars.insert(key, scoped);
        scoped
    }

    /// Full name of the class or function a TypeVar use at `context` belongs
    /// to. A method that uses one of its class's type parameters shares the
    /// class's scope.
    fn type_var_scope_id(&mut self, details: TypeVarDetailId, context: NodeIndex) -> Option<String> {
        let arena = self.arena;
        let owner = std::iter::successors(arena.parent(context), |&n| arena.parent(n))
            .find(|&n| matches!(arena.kind(n), Some(NodeKind::Function | NodeKind::Class)))?;

        if arena.kind(owner) == Some(NodeKind::Function) {
            if let Some(class_node) = self.find_enclosing_class(owner)
                && self.class_declares_type_var(class_node, details)
            {
                return Some(self.definition_full_name(class_node));
            }
            return Some(self.definition_full_name(owner));
        }
        Some(self.definition_full_name(owner))
    }

    fn class_declares_type_var(&mut self, class_node: NodeIndex, details: TypeVarDetailId) -> bool {
        let Some(result) = self.get_type_of_class_node(class_node) else {
            return false;
        };
        let Some(class) = self.types.class_of(result.class_type) else {
            return false;
        };
        class.type_parameters.iter().any(|&param| {
            matches!(
                self.types.get(param).map(|t| &t.kind),
                Some(TypeKind::TypeVar { details: d, .. }) if *d == details
            )
        })
    }

    fn definition_full_name(&self, definition: NodeIndex) -> String {
        let name = match self.arena.get(definition).map(|n| &n.data) {
            Some(NodeData::Function { name, .. } | NodeData::Class { name, .. }) => self
                .arena
                .get(*name)
                .and_then(|n| n.name_value())
                .unwrap_or_default(),
            _ => "",
        };
        self.qualified_name(definition, name)
    }
}
