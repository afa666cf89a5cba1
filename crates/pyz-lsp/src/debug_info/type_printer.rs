//! Cycle-safe rendering of type graphs.
//!
//! The printer walks a type, and everything reachable from it, into a
//! `serde_json::Value` and pretty-prints that. Field order follows the
//! declaration order of the type model. Every handle (type, class, function,
//! TypeVar, node) is expanded at most once per call; a repeat prints a short
//! `<cycle>` marker for classes, functions and TypeVars and is left out
//! otherwise.
//!
//! A handful of fields are rendered by name rather than by number, depending
//! on the record that holds them: a type's `category` and `flags`, the
//! `flags` of class and function details, a TypeVar's `variance` and a
//! parameter's `category`. Syntax nodes are inlined as their one-line
//! [`TreeDumper`] description.

use indexmap::IndexMap;
use pyz_common::LineMap;
use pyz_parser::{NodeArena, NodeIndex};
use pyz_solver::{
    ClassDetailId, ClassTypeResult, FunctionDetailId, FunctionParameter, FunctionTypeResult,
    LiteralValue, ParamSpecEntry, TypeId, TypeKind, TypeStore, TypeVarDetailId,
};
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use tracing::trace;

use super::stringify::{
    class_flag_names, function_flag_names, parameter_category_name, type_category_name,
    type_flag_names, variance_name,
};
use super::tree_dumper::TreeDumper;

/// Anything with identity that the printer may reach twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Handle {
    Type(TypeId),
    Class(ClassDetailId),
    Function(FunctionDetailId),
    TypeVar(TypeVarDetailId),
    Node(NodeIndex),
}

/// The kind of record a field belongs to. Decides how coded fields render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Plain,
    Type { instantiable: bool },
    ClassDetail,
    FunctionDetail,
    TypeVarDetail,
    ParamSpecEntry,
}

/// Every kind of value that can appear in a rendered graph.
#[derive(Debug, Clone, Copy)]
enum Item<'t> {
    Type(TypeId),
    ClassDetail(ClassDetailId),
    FunctionDetail(FunctionDetailId),
    TypeVarDetail(TypeVarDetailId),
    Node(NodeIndex),
    Types(&'t [TypeId]),
    Fields(&'t IndexMap<String, TypeId>),
    Parameters(&'t [FunctionParameter]),
    Entries(&'t [ParamSpecEntry]),
    Literal(&'t LiteralValue),
    Text(&'t str),
    /// Raw enum or bitmask value.
    Code(u32),
    Number(u32),
    Bool(bool),
}

type Fields<'t> = Vec<(&'static str, Option<Item<'t>>)>;

pub struct TypePrinter<'a> {
    types: &'a TypeStore,
    arena: &'a NodeArena,
    dumper: TreeDumper<'a>,
    visited: FxHashSet<Handle>,
}

impl<'a> TypePrinter<'a> {
    pub fn new(types: &'a TypeStore, arena: &'a NodeArena, lines: &'a LineMap) -> Self {
        TypePrinter {
            types,
            arena,
            dumper: TreeDumper::new(lines),
            visited: FxHashSet::default(),
        }
    }

    pub fn print_type(&mut self, ty: TypeId) -> String {
        self.begin();
        let rendered = self.render(Shape::Plain, "", Item::Type(ty));
        self.finish(rendered)
    }

    /// `{classType, decoratedType}`; identical handles print a marker the
    /// second time.
    pub fn print_class_result(&mut self, result: ClassTypeResult) -> String {
        self.begin();
        let fields = vec![
            ("classType", Some(Item::Type(result.class_type))),
            ("decoratedType", Some(Item::Type(result.decorated_type))),
        ];
        let rendered = self.object(Shape::Plain, fields);
        self.finish(Some(rendered))
    }

    pub fn print_function_result(&mut self, result: FunctionTypeResult) -> String {
        self.begin();
        let fields = vec![
            ("functionType", Some(Item::Type(result.function_type))),
            ("decoratedType", Some(Item::Type(result.decorated_type))),
        ];
        let rendered = self.object(Shape::Plain, fields);
        self.finish(Some(rendered))
    }

    fn begin(&mut self) {
        self.visited.clear();
        self.dumper.reset();
    }

    fn finish(&self, rendered: Option<Value>) -> String {
        trace!(visited = self.visited.len(), "rendered type graph");
        format!("{:#}", rendered.unwrap_or(Value::Null))
    }

    fn object(&mut self, shape: Shape, fields: Fields<'a>) -> Value {
        let mut map = Map::new();
        for (key, value) in fields {
            let Some(value) = value else { continue };
            if let Some(rendered) = self.render(shape, key, value) {
                map.insert(key.to_string(), rendered);
            }
        }
        Value::Object(map)
    }

    /// Render `value`, found under `key` in a record of shape `parent`.
    /// `None` drops the field.
    fn render(&mut self, parent: Shape, key: &str, value: Item<'a>) -> Option<Value> {
        if let Some(handle) = handle_of(value)
            && !self.visited.insert(handle)
        {
            return self.cycle_marker(handle).map(Value::String);
        }

        if let Item::Code(raw) = value {
            let named = match (parent, key) {
                (Shape::Type { instantiable }, "category") => {
                    type_category_name(raw, instantiable).into_owned()
                }
                (Shape::Type { .. }, "flags") => type_flag_names(raw),
                (Shape::ClassDetail, "flags") => class_flag_names(raw),
                (Shape::FunctionDetail, "flags") => function_flag_names(raw),
                (Shape::TypeVarDetail, "variance") => variance_name(raw).into_owned(),
                (Shape::ParamSpecEntry, "category") => parameter_category_name(raw).into_owned(),
                _ => return Some(Value::from(raw)),
            };
            return Some(Value::String(named));
        }

        Some(match value {
            Item::Type(ty) => self.type_object(ty),
            Item::ClassDetail(id) => self.class_detail(id),
            Item::FunctionDetail(id) => self.function_detail(id),
            Item::TypeVarDetail(id) => self.type_var_detail(id),
            Item::Node(node) => {
                self.dumper.visit(self.arena, node);
                Value::String(self.dumper.take_output())
            }
            Item::Types(list) => Value::Array(
                list.iter()
                    .map(|&ty| self.render(Shape::Plain, "", Item::Type(ty)))
                    .map(|rendered| rendered.unwrap_or(Value::Null))
                    .collect(),
            ),
            Item::Fields(fields) => {
                let mut map = Map::new();
                for (name, &ty) in fields {
                    if let Some(rendered) = self.render(Shape::Plain, name, Item::Type(ty)) {
                        map.insert(name.clone(), rendered);
                    }
                }
                Value::Object(map)
            }
            Item::Parameters(parameters) => Value::Array(
                parameters
                    .iter()
                    .map(|parameter| {
                        self.object(
                            Shape::ParamSpecEntry,
                            vec![
                                ("category", Some(Item::Code(parameter.category as u32))),
                                ("name", parameter.name.as_deref().map(Item::Text)),
                                (
                                    "hasDeclaredType",
                                    Some(Item::Bool(parameter.has_declared_type)),
                                ),
                                ("type", Some(Item::Type(parameter.type_id))),
                                ("hasDefault", Some(Item::Bool(parameter.has_default))),
                            ],
                        )
                    })
                    .collect(),
            ),
            Item::Entries(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| {
                        self.object(
                            Shape::ParamSpecEntry,
                            vec![
                                ("category", Some(Item::Code(entry.category as u32))),
                                ("name", entry.name.as_deref().map(Item::Text)),
                                ("type", Some(Item::Type(entry.type_id))),
                            ],
                        )
                    })
                    .collect(),
            ),
            Item::Literal(literal) => literal_value(literal),
            Item::Text(text) => Value::String(text.to_string()),
            Item::Number(number) => Value::from(number),
            Item::Bool(flag) => Value::Bool(flag),
            Item::Code(raw) => Value::from(raw),
        })
    }

    fn cycle_marker(&self, handle: Handle) -> Option<String> {
        let Handle::Type(ty) = handle else {
            return None;
        };
        let types = self.types;
        match &types.get(ty)?.kind {
            TypeKind::Class { details, .. } => {
                let class = types.class(*details)?;
                Some(format!(
                    "<cycle> class '{}' id:{}",
                    class.full_name, class.type_source_id
                ))
            }
            TypeKind::Function { details, .. } => {
                let function = types.function(*details)?;
                Some(format!(
                    "<cycle> function '{}' parameter count:{}",
                    function.full_name,
                    function.parameters.len()
                ))
            }
            TypeKind::TypeVar {
                details, scope_id, ..
            } => {
                let type_var = types.type_var(*details)?;
                Some(format!(
                    "<cycle> {} scope id:{}",
                    type_var.name,
                    scope_id.as_deref().unwrap_or("N/A")
                ))
            }
            _ => None,
        }
    }

    fn type_object(&mut self, ty: TypeId) -> Value {
        let types = self.types;
        let Some(resolved) = types.get(ty) else {
            return Value::Null;
        };
        let shape = Shape::Type {
            instantiable: resolved.is_instantiable(),
        };
        let mut fields: Fields<'a> = vec![
            ("category", Some(Item::Code(resolved.category() as u32))),
            ("flags", Some(Item::Code(resolved.flags.bits()))),
        ];
        match &resolved.kind {
            TypeKind::Unbound | TypeKind::Any | TypeKind::None | TypeKind::Never => {}
            TypeKind::Unknown { is_incomplete } => {
                fields.push(("isIncomplete", Some(Item::Bool(*is_incomplete))));
            }
            TypeKind::Function {
                details,
                bound_to_type,
                bound_parameters,
            } => {
                fields.push(("details", Some(Item::FunctionDetail(*details))));
                fields.push(("boundToType", bound_to_type.map(Item::Type)));
                fields.push((
                    "boundParameters",
                    bound_parameters.as_deref().map(Item::Entries),
                ));
            }
            TypeKind::OverloadedFunction { overloads } => {
                fields.push(("overloads", Some(Item::Types(overloads))));
            }
            TypeKind::Class {
                details,
                type_arguments,
                literal_value,
            } => {
                fields.push(("details", Some(Item::ClassDetail(*details))));
                fields.push((
                    "typeArguments",
                    type_arguments.as_deref().map(Item::Types),
                ));
                fields.push(("literalValue", literal_value.as_ref().map(Item::Literal)));
            }
            TypeKind::Module {
                module_name,
                fields: members,
            } => {
                fields.push(("moduleName", Some(Item::Text(module_name))));
                fields.push(("fields", Some(Item::Fields(members))));
            }
            TypeKind::Union { subtypes } => {
                fields.push(("subtypes", Some(Item::Types(subtypes))));
            }
            TypeKind::TypeVar {
                details,
                scope_id,
                name_with_scope,
            } => {
                fields.push(("details", Some(Item::TypeVarDetail(*details))));
                fields.push(("scopeId", scope_id.as_deref().map(Item::Text)));
                fields.push((
                    "nameWithScope",
                    name_with_scope.as_deref().map(Item::Text),
                ));
            }
        }
        self.object(shape, fields)
    }

    fn class_detail(&mut self, id: ClassDetailId) -> Value {
        let types = self.types;
        let Some(class) = types.class(id) else {
            return Value::Null;
        };
        let fields = vec![
            ("name", Some(Item::Text(&class.name))),
            ("fullName", Some(Item::Text(&class.full_name))),
            ("moduleName", Some(Item::Text(&class.module_name))),
            ("flags", Some(Item::Code(class.flags.bits()))),
            ("typeSourceId", Some(Item::Number(class.type_source_id))),
            ("baseClasses", Some(Item::Types(&class.base_classes))),
            ("mro", Some(Item::Types(&class.mro))),
            ("declaredMetaclass", class.declared_metaclass.map(Item::Type)),
            ("effectiveMetaclass", class.effective_metaclass.map(Item::Type)),
            ("fields", Some(Item::Fields(&class.fields))),
            ("typeParameters", Some(Item::Types(&class.type_parameters))),
            ("docString", class.doc_string.as_deref().map(Item::Text)),
            ("declaration", class.declaration.map(Item::Node)),
        ];
        self.object(Shape::ClassDetail, fields)
    }

    fn function_detail(&mut self, id: FunctionDetailId) -> Value {
        let types = self.types;
        let Some(function) = types.function(id) else {
            return Value::Null;
        };
        let fields = vec![
            ("name", Some(Item::Text(&function.name))),
            ("fullName", Some(Item::Text(&function.full_name))),
            ("moduleName", Some(Item::Text(&function.module_name))),
            ("flags", Some(Item::Code(function.flags.bits()))),
            ("parameters", Some(Item::Parameters(&function.parameters))),
            (
                "declaredReturnType",
                function.declared_return_type.map(Item::Type),
            ),
            ("declaration", function.declaration.map(Item::Node)),
        ];
        self.object(Shape::FunctionDetail, fields)
    }

    fn type_var_detail(&mut self, id: TypeVarDetailId) -> Value {
        let types = self.types;
        let Some(type_var) = types.type_var(id) else {
            return Value::Null;
        };
        let fields = vec![
            ("name", Some(Item::Text(&type_var.name))),
            ("constraints", Some(Item::Types(&type_var.constraints))),
            ("boundType", type_var.bound_type.map(Item::Type)),
            ("variance", Some(Item::Code(type_var.variance as u32))),
        ];
        self.object(Shape::TypeVarDetail, fields)
    }
}

fn handle_of(value: Item<'_>) -> Option<Handle> {
    match value {
        Item::Type(ty) => Some(Handle::Type(ty)),
        Item::ClassDetail(id) => Some(Handle::Class(id)),
        Item::FunctionDetail(id) => Some(Handle::Function(id)),
        Item::TypeVarDetail(id) => Some(Handle::TypeVar(id)),
        Item::Node(node) => Some(Handle::Node(node)),
        _ => None,
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Int(value) => Value::from(*value),
        LiteralValue::Float(value) => Value::from(*value),
        LiteralValue::Bool(value) => Value::Bool(*value),
        LiteralValue::Str(value) => Value::String(value.clone()),
    }
}
