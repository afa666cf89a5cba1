//! Tests for evaluator internals: literal widening, iteration, operators,
//! class linearization and recursion cut-off.

use crate::{BinderState, CheckerState};
use pyz_parser::{NodeIndex, NodeKind, ParseResults, parse_file};
use pyz_scanner::OperatorKind;
use pyz_solver::{LiteralValue, TypeCategory, TypeKind};

struct Fixture {
    results: ParseResults,
    binder: BinderState,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let results = parse_file("test.py", source);
        let mut binder = BinderState::new();
        binder.bind_module(&results.arena, results.parse_tree);
        Fixture { results, binder }
    }

    fn checker(&self) -> CheckerState<'_> {
        CheckerState::new(&self.results.arena, &self.binder, "test")
    }

    /// The `nth` node of `kind` in creation order.
    fn nth_node(&self, kind: NodeKind, nth: usize) -> NodeIndex {
        self.results
            .arena
            .iter()
            .filter(|(_, node)| node.kind() == kind)
            .map(|(index, _)| index)
            .nth(nth)
            .unwrap()
    }
}

fn class_name(checker: &CheckerState<'_>, ty: pyz_solver::TypeId) -> String {
    checker
        .types
        .class_of(ty)
        .map(|class| class.name.clone())
        .unwrap_or_default()
}

#[test]
fn strip_literal_widens_members_of_unions() {
    let fixture = Fixture::new("");
    let mut checker = fixture.checker();
    let int = checker.builtins.int;
    let str_class = checker.builtins.str;

    let three = checker.types.literal_instance(int, LiteralValue::Int(3));
    let text = checker
        .types
        .literal_instance(str_class, LiteralValue::Str("a".to_string()));
    let union = checker.types.union(&[three, text]);

    let int_instance = checker.types.class_instance(int);
    assert_eq!(checker.strip_literal(three), int_instance);

    let widened = checker.strip_literal(union);
    let str_instance = checker.types.class_instance(str_class);
    let Some(TypeKind::Union { subtypes }) = checker.types.get(widened).map(|t| &t.kind) else {
        panic!("expected a union");
    };
    assert_eq!(subtypes, &vec![int_instance, str_instance]);

    // Nothing to widen: same handle back.
    assert_eq!(checker.strip_literal(int_instance), int_instance);
}

#[test]
fn iterated_type_of_builtin_containers() {
    let fixture = Fixture::new("");
    let mut checker = fixture.checker();
    let builtins = checker.builtins.clone();
    let int = checker.types.class_instance(builtins.int);
    let str_instance = checker.types.class_instance(builtins.str);

    let list_of_int = checker.types.specialized_instance(builtins.list, vec![int]);
    assert_eq!(checker.iterated_type(list_of_int), int);
    assert_eq!(checker.iterated_type(str_instance), str_instance);

    let pair = checker
        .types
        .specialized_instance(builtins.tuple, vec![int, str_instance]);
    let element = checker.iterated_type(pair);
    assert_eq!(
        checker.types.get(element).map(|t| t.category()),
        Some(TypeCategory::Union)
    );

    let bare_list = checker.types.class_instance(builtins.list);
    let unknown = checker.types.unknown();
    assert_eq!(checker.iterated_type(bare_list), unknown);
}

#[test]
fn binary_operations_fold_int_literals_and_promote() {
    let fixture = Fixture::new("");
    let mut checker = fixture.checker();
    let builtins = checker.builtins.clone();
    let one = checker
        .types
        .literal_instance(builtins.int, LiteralValue::Int(1));
    let two = checker
        .types
        .literal_instance(builtins.int, LiteralValue::Int(2));
    let float = checker.types.class_instance(builtins.float);

    let sum = checker.binary_operation_type(OperatorKind::Add, one, two);
    assert_eq!(
        checker.class_and_literal(sum),
        Some((builtins.int, Some(LiteralValue::Int(3))))
    );

    let mixed = checker.binary_operation_type(OperatorKind::Multiply, one, float);
    assert_eq!(mixed, float);

    let quotient = checker.binary_operation_type(OperatorKind::Divide, one, two);
    assert_eq!(class_name(&checker, quotient), "float");

    let comparison = checker.binary_operation_type(OperatorKind::LessThan, one, float);
    assert_eq!(class_name(&checker, comparison), "bool");
}

#[test]
fn class_mro_follows_c3_linearization() {
    let source = "\
class A: pass
class B(A): pass
class C(A): pass
class D(B, C): pass
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    let d_node = fixture.nth_node(NodeKind::Class, 3);

    let result = checker.get_type_of_class_node(d_node).unwrap();
    let mro: Vec<String> = checker
        .types
        .class_of(result.class_type)
        .unwrap()
        .mro
        .clone()
        .into_iter()
        .map(|ty| class_name(&checker, ty))
        .collect();
    assert_eq!(mro, ["D", "B", "C", "A", "object"]);
}

#[test]
fn self_recursive_function_returns_incomplete_unknown() {
    let fixture = Fixture::new("def f():\n    return f()\n");
    let mut checker = fixture.checker();
    let function = fixture.nth_node(NodeKind::Function, 0);

    let result = checker.get_type_of_function_node(function).unwrap();
    let details = checker
        .types
        .get(result.function_type)
        .and_then(|ty| ty.function_details())
        .unwrap();
    let inferred = checker.inferred_return_type(details);
    assert!(matches!(
        checker.types.get(inferred).map(|t| &t.kind),
        Some(TypeKind::Unknown {
            is_incomplete: true
        })
    ));
}

#[test]
fn falling_off_the_end_adds_none() {
    let source = "\
def f(flag):
    if flag:
        return 1
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    let function = fixture.nth_node(NodeKind::Function, 0);

    let result = checker.get_type_of_function_node(function).unwrap();
    let details = checker
        .types
        .get(result.function_type)
        .and_then(|ty| ty.function_details())
        .unwrap();
    let inferred = checker.inferred_return_type(details);
    let Some(TypeKind::Union { subtypes }) = checker.types.get(inferred).map(|t| &t.kind) else {
        panic!("expected int | None");
    };
    assert_eq!(subtypes.len(), 2);
    assert_eq!(subtypes[1], checker.types.none());
}
