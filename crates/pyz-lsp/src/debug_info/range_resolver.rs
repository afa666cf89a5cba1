//! Map offsets and offset ranges back to the node the evaluator would see.

use pyz_common::TextRange;
use pyz_parser::{NodeArena, NodeIndex, NodeKind, is_expression_node};
use tracing::{debug, trace};

/// Deepest node under `root` covering `offset`.
pub fn find_node_by_offset(arena: &NodeArena, root: NodeIndex, offset: u32) -> Option<NodeIndex> {
    pyz_parser::find_node_by_offset(arena, root, offset)
}

/// Smallest ancestor-or-self of `anchor` containing `target`, widened to the
/// nearest expression node.
pub fn resolve_enclosing_expression(
    arena: &NodeArena,
    anchor: NodeIndex,
    target: TextRange,
) -> Option<NodeIndex> {
    let mut current = anchor;
    while !arena.get(current)?.range().contains_range(target) {
        current = arena.parent(current)?;
    }
    trace!(node = %current, "range contained");

    loop {
        let node = arena.get(current)?;
        if is_expression_node(node) {
            return Some(current);
        }
        current = node.parent?;
    }
}

/// Where a type query over a range should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeQueryTarget {
    /// A name directly under a `class` statement: report the class declaration.
    Class(NodeIndex),
    /// A name directly under a `def` statement, such as its own name or a
    /// bare return annotation: report the function declaration.
    Function(NodeIndex),
    /// Evaluate this expression.
    Expression(NodeIndex),
}

/// Node found at a range for a type query.
///
/// The start offset is tried first, then the end offset. When both resolve
/// to different nodes the start wins.
pub fn find_query_anchor(
    arena: &NodeArena,
    root: NodeIndex,
    range: TextRange,
) -> Option<NodeIndex> {
    find_node_by_offset(arena, root, range.start)
        .or_else(|| find_node_by_offset(arena, root, range.end()))
}

/// Decide what a type query anchored at `anchor` over `range` should report.
pub fn resolve_type_query(
    arena: &NodeArena,
    anchor: NodeIndex,
    range: TextRange,
) -> Option<TypeQueryTarget> {
    if let Some(parent) = arena.parent(anchor)
        && arena.kind(anchor) == Some(NodeKind::Name)
    {
        match arena.kind(parent) {
            Some(NodeKind::Class) => return Some(TypeQueryTarget::Class(parent)),
            Some(NodeKind::Function) => return Some(TypeQueryTarget::Function(parent)),
            _ => {}
        }
    }

    let expression = resolve_enclosing_expression(arena, anchor, range);
    if expression.is_none() {
        debug!(anchor = %anchor, ?range, "no enclosing expression");
    }
    expression.map(TypeQueryTarget::Expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyz_parser::parse_file;

    #[test]
    fn widens_to_the_nearest_expression() {
        let results = parse_file("test.py", "f(a.b, k=v)\n");
        let arena = &results.arena;
        // `b`, inside the member access.
        let anchor = find_node_by_offset(arena, results.parse_tree, 4).unwrap();
        assert_eq!(arena.kind(anchor), Some(NodeKind::Name));
        let member = resolve_enclosing_expression(arena, anchor, TextRange::new(2, 3)).unwrap();
        assert_eq!(arena.kind(member), Some(NodeKind::MemberAccess));

        // `k=v` is only covered by its Argument, which carries no type.
        let value = find_node_by_offset(arena, results.parse_tree, 9).unwrap();
        let call = resolve_enclosing_expression(arena, value, TextRange::new(7, 3)).unwrap();
        assert_eq!(arena.kind(call), Some(NodeKind::Call));
    }

    #[test]
    fn statement_only_ranges_have_no_expression() {
        let results = parse_file("test.py", "pass\n");
        let arena = &results.arena;
        let anchor = find_node_by_offset(arena, results.parse_tree, 1).unwrap();
        assert_eq!(arena.kind(anchor), Some(NodeKind::Pass));
        assert_eq!(
            resolve_enclosing_expression(arena, anchor, TextRange::new(0, 4)),
            None
        );
    }

    #[test]
    fn declaration_names_report_the_declaration() {
        let results = parse_file("test.py", "class C: pass\ndef f() -> int: pass\n");
        let arena = &results.arena;
        let root = results.parse_tree;

        let class_name = find_node_by_offset(arena, root, 6).unwrap();
        let target = resolve_type_query(arena, class_name, TextRange::new(6, 1));
        assert!(matches!(target, Some(TypeQueryTarget::Class(_))));

        let function_name = find_node_by_offset(arena, root, 18).unwrap();
        let target = resolve_type_query(arena, function_name, TextRange::new(18, 1));
        assert!(matches!(target, Some(TypeQueryTarget::Function(_))));

        // A bare return annotation sits directly under the function too.
        let annotation = find_node_by_offset(arena, root, 25).unwrap();
        let target = resolve_type_query(arena, annotation, TextRange::new(25, 3));
        assert_eq!(target, Some(TypeQueryTarget::Function(arena.parent(annotation).unwrap())));

        // A name nested deeper in the signature is still an expression.
        let results = parse_file("test.py", "def g() -> list[int]: pass\n");
        let arena = &results.arena;
        let element = find_node_by_offset(arena, results.parse_tree, 16).unwrap();
        let target = resolve_type_query(arena, element, TextRange::new(16, 3));
        assert_eq!(target, Some(TypeQueryTarget::Expression(element)));
    }

    #[test]
    fn query_anchor_starts_at_the_range_start() {
        let results = parse_file("test.py", "x = 1\n");
        let arena = &results.arena;
        let past_end = TextRange::from_bounds(100, 101);
        assert_eq!(find_query_anchor(arena, results.parse_tree, past_end), None);

        let anchor = find_query_anchor(arena, results.parse_tree, TextRange::new(0, 1)).unwrap();
        assert_eq!(arena.kind(anchor), Some(NodeKind::Name));
    }
}
