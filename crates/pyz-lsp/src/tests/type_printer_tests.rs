//! Tests for type graph rendering.

use crate::debug_info::TypePrinter;
use pyz_common::LineMap;
use pyz_parser::{NodeArena, NodeKind, ParameterCategory, parse_file};
use pyz_solver::{
    ClassDetail, ClassTypeFlags, ClassTypeResult, FunctionDetail, FunctionParameter,
    FunctionTypeFlags, FunctionTypeResult, Type, TypeFlags, TypeKind, TypeStore, TypeVarDetail,
    Variance,
};

fn print(types: &TypeStore, ty: pyz_solver::TypeId) -> String {
    let arena = NodeArena::new();
    let lines = LineMap::build("");
    TypePrinter::new(types, &arena, &lines).print_type(ty)
}

#[test]
fn mutually_recursive_bases_terminate() {
    let mut types = TypeStore::new();
    let a = types.add_class(ClassDetail::new("A", "m", ClassTypeFlags::empty()));
    let b = types.add_class(ClassDetail::new("B", "m", ClassTypeFlags::empty()));
    let a_type = types.class_type(a);
    let b_type = types.class_type(b);
    types.class_mut(a).unwrap().base_classes.push(b_type);
    types.class_mut(b).unwrap().base_classes.push(a_type);

    let output = print(&types, a_type);
    assert_eq!(output.matches("\"fullName\": \"m.A\"").count(), 1, "{output}");
    assert_eq!(output.matches("\"fullName\": \"m.B\"").count(), 1, "{output}");
    assert_eq!(output.matches("<cycle>").count(), 1, "{output}");
    assert!(output.contains("\"<cycle> class 'm.A' id:1\""), "{output}");
}

#[test]
fn class_category_depends_on_instantiability() {
    let mut types = TypeStore::new();
    let class = types.add_class(ClassDetail::new("C", "m", ClassTypeFlags::FINAL));
    let class_type = types.class_type(class);
    let instance = types.class_instance(class);

    let output = print(&types, class_type);
    assert!(output.contains("\"category\": \"Class\""), "{output}");
    assert!(output.contains("\"flags\": \"Instantiable\""), "{output}");
    assert!(output.contains("\"flags\": \"Final\""), "{output}");
    assert!(output.contains("\"typeSourceId\": 1"), "{output}");

    let output = print(&types, instance);
    assert!(output.contains("\"category\": \"Object\""), "{output}");
    assert!(output.contains("\"flags\": \"Instance\""), "{output}");
}

#[test]
fn special_forms_list_both_flags() {
    let types = TypeStore::new();
    let output = print(&types, types.unknown());
    assert!(output.contains("\"category\": \"Unknown\""), "{output}");
    assert!(output.contains("\"flags\": \"Instantiable,Instance\""), "{output}");
    assert!(output.contains("\"isIncomplete\": false"), "{output}");
}

#[test]
fn function_flags_and_parameters_are_named() {
    let mut types = TypeStore::new();
    let unknown = types.unknown();
    let mut detail = FunctionDetail::new(
        "f",
        "m.f",
        "m",
        FunctionTypeFlags::OVERLOADED | FunctionTypeFlags::ASYNC,
    );
    detail.parameters.push(FunctionParameter {
        category: ParameterCategory::VarArgList,
        name: Some("args".to_string()),
        has_declared_type: false,
        type_id: unknown,
        has_default: false,
    });
    let details = types.add_function(detail);
    let function = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::Function {
            details,
            bound_to_type: None,
            bound_parameters: None,
        },
    ));

    let output = print(&types, function);
    assert!(output.contains("\"category\": \"Function\""), "{output}");
    assert!(output.contains("\"flags\": \"Overloaded,Async\""), "{output}");
    assert!(output.contains("\"category\": \"VarArgList\""), "{output}");
    assert!(output.contains("\"name\": \"args\""), "{output}");
    assert!(output.contains("\"hasDeclaredType\": false"), "{output}");
    assert!(!output.contains("boundToType"), "{output}");
    assert!(!output.contains("declaredReturnType"), "{output}");
}

#[test]
fn repeated_type_vars_print_their_scope() {
    let mut types = TypeStore::new();
    let details = types.add_type_var(TypeVarDetail {
        name: "T".to_string(),
        constraints: Vec::new(),
        bound_type: None,
        variance: Variance::Covariant,
    });
    let scoped = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::TypeVar {
            details,
            scope_id: Some("m.f".to_string()),
            name_with_scope: Some("T@f".to_string()),
        },
    ));
    let unscoped = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::TypeVar {
            details,
            scope_id: None,
            name_with_scope: None,
        },
    ));
    let union = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::Union {
            subtypes: vec![scoped, unscoped, scoped],
        },
    ));

    let output = print(&types, union);
    assert!(output.contains("\"variance\": \"Covariant\""), "{output}");
    assert!(output.contains("\"nameWithScope\": \"T@f\""), "{output}");
    assert!(output.contains("\"<cycle> T scope id:m.f\""), "{output}");
    // The shared detail record is expanded once.
    assert_eq!(output.matches("\"variance\"").count(), 1, "{output}");
}

#[test]
fn repeated_plain_types_are_left_out() {
    let mut types = TypeStore::new();
    let none = types.none();
    let union = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::Union {
            subtypes: vec![none, none],
        },
    ));

    let output = print(&types, union);
    assert_eq!(output.matches("\"category\": \"None\"").count(), 1, "{output}");
    assert!(output.contains("null"), "{output}");
    assert!(!output.contains("<cycle>"), "{output}");
}

#[test]
fn class_results_share_visited_handles() {
    let mut types = TypeStore::new();
    let class = types.add_class(ClassDetail::new("C", "m", ClassTypeFlags::empty()));
    let class_type = types.class_type(class);
    let arena = NodeArena::new();
    let lines = LineMap::build("");

    let output = TypePrinter::new(&types, &arena, &lines).print_class_result(ClassTypeResult {
        class_type,
        decorated_type: class_type,
    });
    assert!(output.contains("\"classType\": {"), "{output}");
    assert!(
        output.contains("\"decoratedType\": \"<cycle> class 'm.C' id:1\""),
        "{output}"
    );
}

#[test]
fn function_results_render_both_fields() {
    let mut types = TypeStore::new();
    let detail = FunctionDetail::new("g", "m.g", "m", FunctionTypeFlags::empty());
    let details = types.add_function(detail);
    let function = types.add_type(Type::new(
        TypeFlags::INSTANCE,
        TypeKind::Function {
            details,
            bound_to_type: None,
            bound_parameters: None,
        },
    ));
    let unknown = types.unknown();
    let arena = NodeArena::new();
    let lines = LineMap::build("");

    let output =
        TypePrinter::new(&types, &arena, &lines).print_function_result(FunctionTypeResult {
            function_type: function,
            decorated_type: unknown,
        });
    assert!(output.contains("\"functionType\": {"), "{output}");
    assert!(output.contains("\"flags\": \"None\""), "{output}");
    assert!(output.contains("\"decoratedType\": {"), "{output}");
    assert!(output.contains("\"category\": \"Unknown\""), "{output}");
}

#[test]
fn declarations_are_inlined_as_node_lines() {
    let results = parse_file("test.py", "class C: pass\n");
    let class_node = results
        .arena
        .iter()
        .find(|(_, node)| node.kind() == NodeKind::Class)
        .map(|(index, _)| index)
        .unwrap();

    let mut types = TypeStore::new();
    let mut detail = ClassDetail::new("C", "test", ClassTypeFlags::empty());
    detail.declaration = Some(class_node);
    detail.doc_string = Some("Docs.".to_string());
    let class = types.add_class(detail);
    let instance = types.class_instance(class);

    let output = TypePrinter::new(&types, &results.arena, results.lines()).print_type(instance);
    let expected = format!("\"declaration\": \"[{}] (Class, p:0 ", class_node.id());
    assert!(output.contains(&expected), "{output}");
    assert!(output.contains("\"docString\": \"Docs.\""), "{output}");
}

#[test]
fn printers_can_be_reused() {
    let mut types = TypeStore::new();
    let class = types.add_class(ClassDetail::new("C", "m", ClassTypeFlags::empty()));
    let class_type = types.class_type(class);
    let arena = NodeArena::new();
    let lines = LineMap::build("");

    let mut printer = TypePrinter::new(&types, &arena, &lines);
    let first = printer.print_type(class_type);
    let second = printer.print_type(class_type);
    assert_eq!(first, second);
    assert!(!second.contains("<cycle>"));
}
