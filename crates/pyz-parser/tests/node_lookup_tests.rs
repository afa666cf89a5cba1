//! Tests for offset lookup and expression classification.

use pyz_parser::{NodeKind, find_node_by_offset, is_expression_node, parse_file};

#[test]
fn lookup_finds_innermost_node() {
    let source = "def f(x):\n    return x\n";
    let results = parse_file("test.py", source);
    let arena = &results.arena;

    let found = find_node_by_offset(arena, results.parse_tree, 21).unwrap();
    assert_eq!(arena[found].kind(), NodeKind::Name);
    assert_eq!(arena[found].start, 21);

    // Inside the `return` keyword only the statement covers the offset.
    let found = find_node_by_offset(arena, results.parse_tree, 15).unwrap();
    assert_eq!(arena[found].kind(), NodeKind::Return);
}

#[test]
fn lookup_includes_node_end_offset() {
    let results = parse_file("test.py", "value\n");
    let arena = &results.arena;

    let found = find_node_by_offset(arena, results.parse_tree, 5).unwrap();
    assert_eq!(arena[found].name_value(), Some("value"));
}

#[test]
fn lookup_outside_root_is_none() {
    let source = "x = 1\n";
    let results = parse_file("test.py", source);

    assert!(find_node_by_offset(&results.arena, results.parse_tree, source.len() as u32).is_some());
    assert!(
        find_node_by_offset(&results.arena, results.parse_tree, source.len() as u32 + 1).is_none()
    );
}

#[test]
fn expression_classification() {
    let results = parse_file("test.py", "f(a, b=1)\n");
    let arena = &results.arena;

    for (_, node) in arena.iter() {
        let expected = matches!(
            node.kind(),
            NodeKind::Call | NodeKind::Name | NodeKind::Number
        );
        assert_eq!(
            is_expression_node(node),
            expected,
            "unexpected classification for {:?}",
            node.kind()
        );
    }
}
