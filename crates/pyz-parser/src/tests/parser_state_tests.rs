//! Tests for ParserState expression and statement rules.

use crate::{
    ArgumentCategory, ErrorCategory, NodeData, NodeIndex, NodeKind, ParserState,
    find_node_by_offset,
};
use pyz_scanner::OperatorKind;

fn parse_source(source: &str) -> (ParserState, NodeIndex) {
    let mut parser = ParserState::new("test.py".to_string(), source.to_string());
    let root = parser.parse_source_file();
    (parser, root)
}

/// The expression of the first simple statement in the module.
fn first_expression(parser: &ParserState, root: NodeIndex) -> NodeIndex {
    let arena = parser.get_arena();
    let list = arena.children(root)[0];
    assert_eq!(arena.kind(list), Some(NodeKind::StatementList));
    arena.children(list)[0]
}

#[test]
fn test_function_nodes_are_numbered_bottom_up() {
    let (parser, root) = parse_source("def f(x):\n    return x\n");
    let arena = parser.get_arena();

    assert!(parser.get_diagnostics().is_empty());
    assert_eq!(arena.len(), 9);
    assert_eq!(root, NodeIndex(8));
    assert_eq!(arena.kind(root), Some(NodeKind::Module));
    assert_eq!(arena.kind(NodeIndex(7)), Some(NodeKind::Function));
    assert_eq!(arena.parent(NodeIndex(3)), Some(NodeIndex(4)));

    // Function spans from `def` to the end of its body, without the newline.
    let function = arena.range(NodeIndex(7)).unwrap();
    assert_eq!((function.start, function.end()), (0, 22));
    // Suites start at their colon.
    let suite = arena.range(NodeIndex(6)).unwrap();
    assert_eq!(suite.start, 8);
}

#[test]
fn test_binary_operator_precedence() {
    let (parser, root) = parse_source("a + b * c\n");
    let arena = parser.get_arena();
    let expr = first_expression(&parser, root);

    let NodeData::BinaryOperation {
        operator, right, ..
    } = &arena[expr].data
    else {
        panic!("expected binary operation, got {:?}", arena[expr].kind());
    };
    assert_eq!(*operator, OperatorKind::Add);
    assert!(matches!(
        arena[*right].data,
        NodeData::BinaryOperation {
            operator: OperatorKind::Multiply,
            ..
        }
    ));
}

#[test]
fn test_power_is_right_associative_and_binds_tighter_than_unary() {
    let (parser, root) = parse_source("-a ** b ** c\n");
    let arena = parser.get_arena();
    let expr = first_expression(&parser, root);

    let NodeData::UnaryOperation { expression, .. } = &arena[expr].data else {
        panic!("expected unary operation");
    };
    let NodeData::BinaryOperation { right, .. } = &arena[*expression].data else {
        panic!("expected power");
    };
    assert!(matches!(
        arena[*right].data,
        NodeData::BinaryOperation {
            operator: OperatorKind::Power,
            ..
        }
    ));
}

#[test]
fn test_parenthesized_binary_operation_covers_parens() {
    let (parser, root) = parse_source("(a + b) * c\n");
    let arena = parser.get_arena();
    let expr = first_expression(&parser, root);

    let NodeData::BinaryOperation { left, .. } = &arena[expr].data else {
        panic!("expected binary operation");
    };
    assert!(matches!(
        arena[*left].data,
        NodeData::BinaryOperation {
            parenthesized: true,
            ..
        }
    ));
    let range = arena.range(*left).unwrap();
    assert_eq!((range.start, range.end()), (0, 7));
}

#[test]
fn test_two_word_comparison_operators() {
    for (source, expected) in [
        ("a is not b\n", OperatorKind::IsNot),
        ("a not in b\n", OperatorKind::NotIn),
        ("a in b\n", OperatorKind::In),
        ("a <= b\n", OperatorKind::LessThanOrEqual),
    ] {
        let (parser, root) = parse_source(source);
        let arena = parser.get_arena();
        let expr = first_expression(&parser, root);
        match &arena[expr].data {
            NodeData::BinaryOperation { operator, .. } => {
                assert_eq!(*operator, expected, "source: {source:?}")
            }
            other => panic!("expected binary operation for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_unclosed_tuple_produces_error_node() {
    let (parser, _root) = parse_source("x = (1, 2\n");
    let arena = parser.get_arena();

    assert!(!parser.get_diagnostics().is_empty());
    let error = arena
        .iter()
        .find(|(_, node)| node.kind() == NodeKind::Error)
        .map(|(_, node)| node.data.clone());
    assert!(matches!(
        error,
        Some(NodeData::Error {
            category: ErrorCategory::MissingTupleCloseParen,
            child: Some(_),
        })
    ));
}

#[test]
fn test_missing_parameter_list_wraps_function_name() {
    let (parser, root) = parse_source("def f:\n    pass\n");
    let arena = parser.get_arena();

    let first = arena.children(root)[0];
    let NodeData::Error { category, child } = &arena[first].data else {
        panic!("expected error node, got {:?}", arena[first].kind());
    };
    assert_eq!(*category, ErrorCategory::MissingFunctionParameterList);
    let name = child.expect("error should keep the function name");
    assert_eq!(arena[name].name_value(), Some("f"));
}

#[test]
fn test_empty_subscript_is_missing_index() {
    let (parser, root) = parse_source("x[]\n");
    let arena = parser.get_arena();
    let expr = first_expression(&parser, root);

    let NodeData::Index { items, .. } = &arena[expr].data else {
        panic!("expected index expression");
    };
    assert_eq!(items.len(), 1);
    let NodeData::Argument {
        category, value, ..
    } = &arena[items[0]].data
    else {
        panic!("subscript items are arguments");
    };
    assert_eq!(*category, ArgumentCategory::Simple);
    assert!(matches!(
        arena[*value].data,
        NodeData::Error {
            category: ErrorCategory::MissingIndexOrSlice,
            ..
        }
    ));
}

#[test]
fn test_ternary_without_else() {
    let (parser, root) = parse_source("a if b\n");
    let arena = parser.get_arena();
    let expr = first_expression(&parser, root);

    let NodeData::Ternary {
        else_expression, ..
    } = &arena[expr].data
    else {
        panic!("expected ternary");
    };
    assert!(matches!(
        arena[*else_expression].data,
        NodeData::Error {
            category: ErrorCategory::MissingElse,
            ..
        }
    ));
}

#[test]
fn test_wildcard_and_relative_imports() {
    let (parser, root) = parse_source("from . import *\nfrom a. import b\n");
    let arena = parser.get_arena();

    let import_from: Vec<_> = arena
        .iter()
        .filter(|(_, node)| node.kind() == NodeKind::ImportFrom)
        .map(|(_, node)| node.data.clone())
        .collect();
    assert_eq!(import_from.len(), 2);

    let NodeData::ImportFrom {
        module,
        is_wildcard_import,
        wildcard_token,
        ..
    } = &import_from[0]
    else {
        unreachable!();
    };
    assert!(*is_wildcard_import);
    assert!(wildcard_token.is_some());
    assert!(matches!(
        arena[*module].data,
        NodeData::ModuleName { leading_dots: 1, .. }
    ));

    let NodeData::ImportFrom { module, .. } = &import_from[1] else {
        unreachable!();
    };
    assert!(matches!(
        arena[*module].data,
        NodeData::ModuleName {
            has_trailing_dot: true,
            ..
        }
    ));
    assert!(!parser.get_diagnostics().is_empty());
    assert_eq!(arena.children(root).len(), 2);
}

#[test]
fn test_decorators_come_first_in_children() {
    let (parser, root) = parse_source("@dec\ndef f(a, *args, **kw) -> int:\n    pass\n");
    let arena = parser.get_arena();

    let function = arena.children(root)[0];
    let kinds: Vec<_> = arena
        .children(function)
        .iter()
        .map(|&c| arena[c].kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Decorator,
            NodeKind::Name,
            NodeKind::Parameter,
            NodeKind::Parameter,
            NodeKind::Parameter,
            NodeKind::Name,
            NodeKind::Suite,
        ]
    );
    // Decorated functions start at the decorator.
    assert_eq!(arena[function].start, 0);
}

#[test]
fn test_offset_lookup_prefers_earlier_sibling_at_boundary() {
    let (parser, root) = parse_source("ab+cd\n");
    let arena = parser.get_arena();

    // Offset 2 is both the end of `ab` and the start of `+`.
    let found = find_node_by_offset(arena, root, 2).unwrap();
    assert_eq!(arena[found].name_value(), Some("ab"));
    let found = find_node_by_offset(arena, root, 3).unwrap();
    assert_eq!(arena[found].name_value(), Some("cd"));
}

fn depth_errors(parser: &ParserState) -> usize {
    parser
        .get_arena()
        .iter()
        .filter(|(_, node)| {
            matches!(
                node.data,
                NodeData::Error {
                    category: ErrorCategory::MaxDepthExceeded,
                    ..
                }
            )
        })
        .count()
}

#[test]
fn test_deeply_nested_parentheses_stop_at_depth_limit() {
    let source = format!("x = {}1{}\ny = 2\n", "(".repeat(1000), ")".repeat(1000));
    let (parser, root) = parse_source(&source);

    assert_eq!(depth_errors(&parser), 1);
    assert!(
        parser
            .get_diagnostics()
            .iter()
            .any(|diag| diag.message == "Maximum parse depth exceeded")
    );
    // The next line parses normally.
    let arena = parser.get_arena();
    assert_eq!(arena.children(root).len(), 2);
    let second = arena.children(arena.children(root)[1])[0];
    assert_eq!(arena.kind(second), Some(NodeKind::Assignment));
}

#[test]
fn test_long_unary_chain_stops_at_depth_limit() {
    let source = format!("{}1\n", "- ".repeat(1000));
    let (parser, _) = parse_source(&source);

    assert_eq!(depth_errors(&parser), 1);
    assert_eq!(parser.get_diagnostics().len(), 1);
    assert_eq!(
        parser.get_diagnostics()[0].message,
        "Maximum parse depth exceeded"
    );
}

#[test]
fn test_nesting_below_depth_limit_is_accepted() {
    let source = format!("{}1{}\n", "(".repeat(100), ")".repeat(100));
    let (parser, _) = parse_source(&source);

    assert!(parser.get_diagnostics().is_empty());
    assert_eq!(depth_errors(&parser), 0);
}
