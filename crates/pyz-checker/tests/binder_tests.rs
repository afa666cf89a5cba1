//! Tests for scopes, symbols and declarations produced by the binder.

use pyz_checker::{BinderState, DeclarationKind, ScopeKind};
use pyz_parser::{NodeIndex, NodeKind, ParseResults, parse_file};

fn bind(source: &str) -> (ParseResults, BinderState) {
    let results = parse_file("test.py", source);
    let mut binder = BinderState::new();
    binder.bind_module(&results.arena, results.parse_tree);
    (results, binder)
}

fn nth_node(results: &ParseResults, kind: NodeKind, nth: usize) -> NodeIndex {
    results
        .arena
        .iter()
        .filter(|(_, node)| node.kind() == kind)
        .map(|(index, _)| index)
        .nth(nth)
        .unwrap()
}

/// The `nth` `Name` node spelling `name`, in source order.
fn name_node(results: &ParseResults, name: &str, nth: usize) -> NodeIndex {
    let mut names: Vec<(u32, NodeIndex)> = results
        .arena
        .iter()
        .filter(|(_, node)| node.name_value() == Some(name))
        .map(|(index, node)| (node.start, index))
        .collect();
    names.sort();
    names[nth].1
}

#[test]
fn module_and_function_scopes_hold_their_names() {
    let (results, binder) = bind("x = 1\ndef f(a):\n    y = a\n");
    let module = binder.scope(binder.module_scope()).unwrap();
    assert_eq!(module.kind, ScopeKind::Module);
    let names: Vec<&str> = module.symbols.keys().map(String::as_str).collect();
    assert_eq!(names, ["x", "f"]);

    let function = nth_node(&results, NodeKind::Function, 0);
    let scope = binder.scope(binder.scope_of_node(function).unwrap()).unwrap();
    assert_eq!(scope.kind, ScopeKind::Function);
    assert_eq!(scope.parent, Some(binder.module_scope()));
    let a = &scope.lookup("a").unwrap().declarations[0];
    assert_eq!(a.kind, DeclarationKind::Parameter);
    assert_eq!(results.arena.kind(a.node), Some(NodeKind::Parameter));
    let y = &scope.lookup("y").unwrap().declarations[0];
    assert_eq!(y.kind, DeclarationKind::Variable);
    assert!(y.source.is_some());
}

#[test]
fn global_statement_binds_in_module_scope() {
    let (_, binder) = bind("def g():\n    global z\n    z = 1\n");
    let module = binder.scope(binder.module_scope()).unwrap();
    assert!(module.lookup("z").is_some());
}

#[test]
fn class_scope_is_invisible_from_methods() {
    let source = "\
class C:
    attr = 1
    def m(self):
        return attr
";
    let (results, binder) = bind(source);
    let usage = name_node(&results, "attr", 1);
    let scope = binder.scope_containing(&results.arena, usage);
    assert!(binder.lookup_name(scope, "attr").is_none());

    let class = nth_node(&results, NodeKind::Class, 0);
    let class_scope = binder.scope_of_node(class).unwrap();
    assert!(binder.lookup_name(class_scope, "attr").is_some());
}

#[test]
fn self_assignments_become_instance_variables() {
    let source = "\
class C:
    def __init__(self, v):
        self.value = v
        other.value = v
";
    let (results, binder) = bind(source);
    let class = nth_node(&results, NodeKind::Class, 0);
    let variables = binder.instance_variables.get(&class).unwrap();
    assert_eq!(variables.len(), 1);
    let declarations = &variables["value"];
    assert_eq!(declarations.len(), 1);
    assert_eq!(
        results.arena.kind(declarations[0].node),
        Some(NodeKind::MemberAccess)
    );
}

#[test]
fn first_comprehension_iterable_belongs_to_outer_scope() {
    let (results, binder) = bind("items = []\nout = [i for i in items]\n");
    let iterable = name_node(&results, "items", 1);
    assert_eq!(
        binder.scope_containing(&results.arena, iterable),
        binder.module_scope()
    );

    let element = name_node(&results, "i", 0);
    let scope = binder.scope_containing(&results.arena, element);
    assert_eq!(binder.scope(scope).unwrap().kind, ScopeKind::Comprehension);
    assert!(binder.scope(scope).unwrap().lookup("i").is_some());
}

#[test]
fn returns_and_yields_are_recorded_per_function() {
    let (results, binder) = bind("def g():\n    yield 1\n    return\n\ndef h():\n    pass\n");
    let g = nth_node(&results, NodeKind::Function, 0);
    let h = nth_node(&results, NodeKind::Function, 1);
    assert!(binder.is_generator(g));
    assert_eq!(binder.returns_of(g).len(), 1);
    assert!(!binder.is_generator(h));
    assert!(binder.returns_of(h).is_empty());
}

#[test]
fn tuple_targets_record_unpack_paths() {
    let (results, binder) = bind("a, (b, c) = t\n");
    let c = name_node(&results, "c", 0);
    let declaration = binder.declaration(c).unwrap();
    assert_eq!(declaration.unpack_path.as_slice(), &[1, 1]);
    let a = binder.declaration(name_node(&results, "a", 0)).unwrap();
    assert_eq!(a.unpack_path.as_slice(), &[0]);
}

#[test]
fn nonlocal_rebinds_enclosing_function_symbol() {
    let source = "\
def outer():
    count = 0
    def inner():
        nonlocal count
        count = 1
";
    let (results, binder) = bind(source);
    let outer = nth_node(&results, NodeKind::Function, 1);
    let scope = binder.scope(binder.scope_of_node(outer).unwrap()).unwrap();
    assert_eq!(scope.lookup("count").unwrap().declarations.len(), 2);
}

#[test]
fn rebinding_resets_previous_state() {
    let results = parse_file("test.py", "x = 1\n");
    let mut binder = BinderState::new();
    binder.bind_module(&results.arena, results.parse_tree);
    binder.bind_module(&results.arena, results.parse_tree);
    assert_eq!(binder.scopes.len(), 1);
    assert_eq!(
        binder
            .scope(binder.module_scope())
            .unwrap()
            .lookup("x")
            .unwrap()
            .declarations
            .len(),
        1
    );
}
