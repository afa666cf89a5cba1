//! Tests for parse tree rendering.

use crate::debug_info::TreeDumper;
use pyz_parser::{NodeKind, ParseResults, ParseTreeWalker, parse_file};

fn nth_node(results: &ParseResults, kind: NodeKind, nth: usize) -> pyz_parser::NodeIndex {
    results
        .arena
        .iter()
        .filter(|(_, node)| node.kind() == kind)
        .map(|(index, _)| index)
        .nth(nth)
        .unwrap()
}

#[test]
fn walk_indents_children_below_their_parent() {
    let results = parse_file("test.py", "x = 1\n");
    let mut dumper = TreeDumper::new(results.lines());
    dumper.walk(&results.arena, results.parse_tree);

    let output = dumper.take_output();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 5, "unexpected dump:\n{output}");
    assert!(lines[0].starts_with('['));
    assert!(lines[0].contains("(Module, p:0 "));
    assert!(lines[1].starts_with("  ["));
    assert!(lines[1].contains("(StatementList, "));
    assert!(lines[2].starts_with("    ["));
    assert!(lines[2].contains("(Assignment, p:0 l:5 [(0,0)-(0,5)])"));
    assert!(lines[3].starts_with("      ["));
    assert!(lines[3].contains("(Name, p:0 l:1 [(0,0)-(0,1)]) (Identifier, (0,0)-(0,1)) {"));
    assert!(lines[3].ends_with(" x"));
    assert!(lines[4].ends_with("1 int:(true) imaginary:(false)"));
}

#[test]
fn node_ids_are_arena_indices() {
    let results = parse_file("test.py", "pass\n");
    let pass = nth_node(&results, NodeKind::Pass, 0);
    let mut dumper = TreeDumper::new(results.lines());
    dumper.visit(&results.arena, pass);
    assert_eq!(
        dumper.take_output(),
        format!("[{}] (Pass, p:0 l:4 [(0,0)-(0,4)])\n", pass.id())
    );
}

#[test]
fn visit_emits_a_single_line() {
    let results = parse_file("test.py", "def f(x):\n    return x\n");
    let function = nth_node(&results, NodeKind::Function, 0);
    let mut dumper = TreeDumper::new(results.lines());
    dumper.visit(&results.arena, function);
    let output = dumper.take_output();
    assert_eq!(output.lines().count(), 1);
    assert!(output.trim_end().ends_with("async:(false)"));
}

#[test]
fn reset_leaves_no_residual_state() {
    let results = parse_file("test.py", "if a:\n    b = a + 1\nc = (1, 2)\n");
    let first = nth_node(&results, NodeKind::If, 0);
    let second = nth_node(&results, NodeKind::Tuple, 0);

    let mut reused = TreeDumper::new(results.lines());
    reused.walk(&results.arena, first);
    reused.reset();
    reused.walk(&results.arena, second);

    let mut fresh = TreeDumper::new(results.lines());
    fresh.walk(&results.arena, second);

    let fresh = fresh.take_output();
    assert_eq!(reused.take_output(), fresh);
    assert!(fresh.starts_with('['));
    assert!(fresh.lines().next().unwrap().ends_with("paren:(true)"));
}

#[test]
fn operators_show_their_token_and_name() {
    let results = parse_file("test.py", "a + b\n-a\n");
    let binary = nth_node(&results, NodeKind::BinaryOperation, 0);
    let unary = nth_node(&results, NodeKind::UnaryOperation, 0);
    let mut dumper = TreeDumper::new(results.lines());

    dumper.visit(&results.arena, binary);
    let line = dumper.take_output();
    assert!(line.contains("(Operator, Add, (0,2)-(0,3))"), "{line}");
    assert!(line.trim_end().ends_with(" Add parenthesized:(false)"), "{line}");

    dumper.visit(&results.arena, unary);
    let line = dumper.take_output();
    assert!(line.contains("(Operator, Subtract, (1,0)-(1,1))"), "{line}");
    assert!(line.trim_end().ends_with(" Subtract"), "{line}");
}

#[test]
fn import_from_and_module_names_report_their_flags() {
    let results = parse_file("test.py", "from ..pkg import *\n");
    let import = nth_node(&results, NodeKind::ImportFrom, 0);
    let module = nth_node(&results, NodeKind::ModuleName, 0);
    let mut dumper = TreeDumper::new(results.lines());

    dumper.visit(&results.arena, module);
    let line = dumper.take_output();
    assert!(line.trim_end().ends_with("leading dots:(2) trailing dot:(false)"), "{line}");

    dumper.visit(&results.arena, import);
    let line = dumper.take_output();
    assert!(
        line.contains("wildcard import:(true) paren:(false) wildcard token:((Operator, Multiply"),
        "{line}"
    );
    assert!(line.trim_end().ends_with("missing import keyword:(false)"), "{line}");
}
